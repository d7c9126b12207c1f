//! Parser for the `<questions>` section.

use crate::error::SubmissionError;
use crate::values::{decode_value, parse_int};
use crate::xml::Element;

use super::model::{Answer, Question, QuestionTarget};

pub fn parse_questions(node: &Element) -> Result<Vec<Question>, SubmissionError> {
    node.children.iter().map(parse_question).collect()
}

fn parse_question(node: &Element) -> Result<Question, SubmissionError> {
    assert_eq!(node.tag, "question", "unexpected <{}> in <questions>", node.tag);

    let mut question = Question {
        name: node
            .attr("name")
            .ok_or_else(|| SubmissionError::MissingAttribute {
                element: "question".into(),
                attribute: "name".into(),
            })?
            .to_string(),
        plugin: node.attr("plugin").map(str::to_string),
        targets: Vec::new(),
        answer: None,
        answer_choices: Vec::new(),
        command: None,
        comment: None,
    };

    for sub in &node.children {
        match sub.tag.as_str() {
            "answer" => question.answer = Some(parse_answer(sub)),
            "answer_choices" => {
                question.answer_choices = sub
                    .children
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "target" => question.targets.push(parse_target(sub)?),
            "comment" => question.comment = Some(sub.text().to_string()),
            "command" => question.command = Some(sub.text().to_string()),
            other => panic!("unexpected <{}> in <question> passed schema validation", other),
        }
    }
    Ok(question)
}

fn parse_answer(node: &Element) -> Answer {
    let answer_type = node.attr("type").unwrap_or_default().to_string();
    let unit = if answer_type == "measurement" {
        node.attr("unit").map(str::to_string)
    } else {
        None
    };
    Answer {
        answer_type,
        value: node.text().to_string(),
        unit,
    }
}

fn parse_target(node: &Element) -> Result<QuestionTarget, SubmissionError> {
    let id = node
        .attr("id")
        .ok_or_else(|| SubmissionError::MissingAttribute {
            element: "target".into(),
            attribute: "id".into(),
        })?;
    Ok(QuestionTarget {
        id: parse_int(id)?,
        drivers: node
            .children_named("driver")
            .map(|driver| driver.text().to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::TypedValue;
    use crate::xml::parse_document;

    fn parse(xml: &str) -> Element {
        parse_document(xml.as_bytes(), 64).unwrap()
    }

    #[test]
    fn test_multiple_choice_question() {
        let node = parse(
            r#"<questions>
                <question name="detected_network_controllers" plugin="find_network_controllers">
                  <target id="42">
                    <driver>ipw3945</driver>
                  </target>
                  <target id="43"/>
                  <answer type="multiple_choice">pass</answer>
                  <answer_choices>
                    <value type="str">fail</value>
                    <value type="str">pass</value>
                  </answer_choices>
                  <comment>The WLAN adapter drops its connection sometimes.</comment>
                </question>
              </questions>"#,
        );
        let questions = parse_questions(&node).unwrap();
        let q = &questions[0];
        assert_eq!(q.name, "detected_network_controllers");
        assert_eq!(q.plugin.as_deref(), Some("find_network_controllers"));
        assert_eq!(q.targets.len(), 2);
        assert_eq!(q.targets[0].drivers, vec!["ipw3945"]);
        assert!(q.targets[1].drivers.is_empty());
        let answer = q.answer.as_ref().unwrap();
        assert_eq!(answer.answer_type, "multiple_choice");
        assert_eq!(answer.value, "pass");
        assert_eq!(answer.unit, None);
        assert_eq!(
            q.answer_choices,
            vec![TypedValue::Str("fail".into()), TypedValue::Str("pass".into())]
        );
        assert!(q.command.is_none());
    }

    #[test]
    fn test_measurement_question() {
        let node = parse(
            r#"<questions>
                <question name="internet_bandwidth">
                  <answer type="measurement" unit="MBit/s">20.5</answer>
                  <command>ping -c 10 example.com</command>
                </question>
              </questions>"#,
        );
        let questions = parse_questions(&node).unwrap();
        let answer = questions[0].answer.as_ref().unwrap();
        assert_eq!(answer.unit.as_deref(), Some("MBit/s"));
        assert_eq!(answer.value, "20.5");
        assert_eq!(questions[0].command.as_deref(), Some("ping -c 10 example.com"));
        assert!(questions[0].plugin.is_none());
    }

    #[test]
    fn test_bad_target_id() {
        let node = parse(r#"<questions><question name="q"><target id="x"/></question></questions>"#);
        assert!(parse_questions(&node).is_err());
    }

    #[test]
    #[should_panic(expected = "passed schema validation")]
    fn test_unknown_sub_tag_panics() {
        let node = parse(r#"<questions><question name="q"><hint/></question></questions>"#);
        let _ = parse_questions(&node);
    }
}

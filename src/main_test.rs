use super::*;

fn person(name: &str, id: &str) -> Person {
    Person { name: name.to_owned(), id: id.to_owned() }
}

#[test]
fn absent_result_renders_as_null() {
    assert_eq!(render_json(&None::<Person>).expect("render"), "null");
    assert_eq!(render_json(&None::<Vec<Person>>).expect("render"), "null");
}

#[test]
fn found_result_renders_as_pretty_object() {
    let rendered = render_json(&Some(person("a", "1"))).expect("render");
    assert_eq!(rendered, "{\n  \"name\": \"a\",\n  \"id\": \"1\"\n}");
}

#[test]
fn all_results_render_as_array() {
    let rendered = render_json(&Some(vec![person("a", "1"), person("b", "2")])).expect("render");
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
    assert_eq!(value, serde_json::json!([{"name": "a", "id": "1"}, {"name": "b", "id": "2"}]));
}

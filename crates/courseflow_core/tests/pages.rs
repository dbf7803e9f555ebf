use std::sync::Once;

use courseflow_core::{flow_identifier, CourseItem, Page};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(flow_logging::initialize_for_tests);
}

#[test]
fn page_id_replaces_hyphens_and_appends_position() {
    init_logging();
    let page = Page::new("intro-to-graphs", 3, "Intro to Graphs", "<p>x</p>".into());

    assert_eq!(page.id, "intro_to_graphs_3");
    assert_eq!(page.title, "Intro to Graphs");
}

#[test]
fn flow_identifier_is_fully_hyphenated() {
    init_logging();
    let id = flow_identifier("algo_course", 2, "graph_basics");

    assert_eq!(id, "algo-course-2-graph-basics");
    assert!(!id.contains('_'));
}

#[test]
fn item_accessors_cover_all_variants() {
    init_logging();
    let lecture = CourseItem::Lecture {
        slug: "l1".into(),
        name: "Lecture one".into(),
    };
    let text = CourseItem::Text {
        slug: "t1".into(),
        name: "Reading".into(),
        content: Some("<p>hello</p>".into()),
    };
    let reference = CourseItem::Reference {
        slug: "r1".into(),
        name: "Handout".into(),
        content: None,
    };

    assert_eq!(lecture.slug(), "l1");
    assert_eq!(text.name(), "Reading");
    assert_eq!(reference.slug(), "r1");
}

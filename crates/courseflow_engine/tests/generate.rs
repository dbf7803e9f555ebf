mod common;

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use url::Url;

use courseflow_core::Course;
use courseflow_engine::{AssetResolver, CourseRepository, FlowGenerator};

use common::{
    empty_archive, init_logging, insert_course, insert_course_asset, insert_item,
    insert_item_asset, insert_module, insert_reference, insert_video_asset, repository,
    CollectingProgress, CollectingSink,
};

const COURSE: &str = "algo-course";

fn course() -> Course {
    Course {
        slug: COURSE.to_string(),
        name: "Algorithms".to_string(),
    }
}

fn relative_resolver() -> AssetResolver {
    AssetResolver::relative(
        PathBuf::from("/archive"),
        Url::parse("https://cdn.example.com/media/").unwrap(),
    )
}

fn generate(repo: &CourseRepository) -> CollectingSink {
    let sink = CollectingSink::default();
    let progress = Arc::new(CollectingProgress::default());
    let mut generator = FlowGenerator::new(repo, relative_resolver(), &sink, progress);
    generator.generate_course(&course()).unwrap();
    sink
}

#[test]
fn lecture_without_video_asset_yields_no_page() {
    // Scenario: a module with two lecture items, one carrying a video asset
    // with subtitles "en.vtt,zh-CN.vtt", one carrying nothing.
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", Some("Graph basics"), 1, COURSE);
    insert_item(&conn, "intro-lecture", "Intro", "lecture", None, "graphs");
    insert_video_asset(
        &conn,
        "intro-lecture",
        "algo-course/videos/intro.mp4",
        "en.vtt,zh-CN.vtt",
    );
    insert_item(&conn, "silent-lecture", "Silent", "lecture", None, "graphs");
    let repo = repository(conn);

    let sink = generate(&repo);

    let flow = sink
        .document("algo-course/flows/algo-course-1-graphs.yml")
        .unwrap();
    // Exactly one page: the lecture without a video asset contributes none.
    assert_eq!(flow.matches("type: Page").count(), 1);
    assert!(flow.contains("id: intro_lecture_1"));
    assert!(!flow.contains("silent_lecture"));

    // Subtitle order follows the fixed priority: zh-CN (default), then en.
    let zh = flow.find("srclang='zh-CN'").unwrap();
    let en = flow.find("srclang='en'").unwrap();
    assert!(zh < en);
    assert_eq!(flow.matches(" default />").count(), 1);
    assert!(flow.contains("srclang='zh-CN' label='Simplified Chinese' default />"));
    assert!(flow.contains("src='https://cdn.example.com/media/algo-course/videos/intro.mp4'"));
    assert!(flow.contains("src='https://cdn.example.com/media/algo-course/videos/intro.zh-CN.vtt'"));
}

#[test]
fn skipped_items_still_advance_the_position_counter() {
    // Scenario: an item with no raw content and no video asset produces no
    // page but still increments the position used for later identifiers.
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", None, 1, COURSE);
    insert_item(&conn, "empty-note", "Empty", "supplement", None, "graphs");
    insert_item(
        &conn,
        "reading",
        "Reading",
        "supplement",
        Some("<p>hello</p>"),
        "graphs",
    );
    let repo = repository(conn);

    let sink = generate(&repo);
    let flow = sink
        .document("algo-course/flows/algo-course-1-graphs.yml")
        .unwrap();

    assert_eq!(flow.matches("type: Page").count(), 1);
    assert!(!flow.contains("empty_note"));
    // Position 2, not 1: the skipped item counted.
    assert!(flow.contains("id: reading_2"));
}

#[test]
fn unknown_asset_reference_does_not_abort_generation() {
    // Scenario: markup references an asset the repository does not know.
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", None, 1, COURSE);
    insert_item(
        &conn,
        "reading",
        "Reading",
        "supplement",
        Some(r#"<p><asset id="gone" name="Gone" extension="pdf" assettype="pdf"></asset></p>"#),
        "graphs",
    );
    let repo = repository(conn);

    let sink = generate(&repo);
    let flow = sink
        .document("algo-course/flows/algo-course-1-graphs.yml")
        .unwrap();

    // The element survives as literal markup; generation completed.
    assert!(flow.contains("<asset"));
    assert!(flow.contains(r#"id="gone""#));
}

#[test]
fn references_become_a_trailing_resources_flow() {
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", None, 1, COURSE);
    insert_item(
        &conn,
        "reading",
        "Reading",
        "supplement",
        Some("<p>hello</p>"),
        "graphs",
    );
    insert_reference(&conn, "handout", "Handout", "<p>extra</p>", COURSE);
    let repo = repository(conn);

    let sink = generate(&repo);
    let paths = sink.paths();

    // The resources flow carries the ordinal one past the last module.
    assert!(paths.contains(&"algo-course/flows/algo-course-2-resource.yml".to_string()));
    let resources = sink
        .document("algo-course/flows/algo-course-2-resource.yml")
        .unwrap();
    assert!(resources.starts_with("title: \"Resources\"\n"));
    assert!(resources.contains("id: handout_1"));

    // Both manifests list the module flow and the resources flow.
    let embedded = sink
        .document("algo-course/algo-course_course_chunks.yml")
        .unwrap();
    let standalone = sink.document("algo-course/course.yml").unwrap();
    for doc in [&embedded, &standalone] {
        assert!(doc.contains("flow:algo-course-1-graphs"));
        assert!(doc.contains("flow:algo-course-2-resource"));
        assert!(doc.contains("Module 2: Resources"));
    }
}

#[test]
fn course_without_references_publishes_module_flows_and_manifests_only() {
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", None, 1, COURSE);
    insert_module(&conn, "trees", "Trees", None, 2, COURSE);
    let repo = repository(conn);

    let sink = generate(&repo);
    let paths = sink.paths();

    assert_eq!(
        paths,
        vec![
            "algo-course/flows/algo-course-1-graphs.yml".to_string(),
            "algo-course/flows/algo-course-2-trees.yml".to_string(),
            "algo-course/algo-course_course_chunks.yml".to_string(),
            "algo-course/course.yml".to_string(),
        ]
    );
}

#[test]
fn lecture_resources_are_listed_after_the_video() {
    init_logging();
    let conn = empty_archive();
    insert_course(&conn, COURSE, "Algorithms");
    insert_module(&conn, "graphs", "Graphs", None, 1, COURSE);
    insert_item(&conn, "intro-lecture", "Intro", "lecture", None, "graphs");
    insert_video_asset(&conn, "intro-lecture", "algo-course/videos/intro.mp4", "");
    insert_item_asset(
        &conn,
        "intro-lecture",
        "asset-1",
        "pdf",
        "Slides",
        "algo-course/files/slides.pdf",
    );
    insert_course_asset(&conn, "asset-1", "pdf", "Slides", "algo-course/files/slides.pdf");
    let repo = repository(conn);

    let sink = generate(&repo);
    let flow = sink
        .document("algo-course/flows/algo-course-1-graphs.yml")
        .unwrap();

    assert!(flow.contains("<h3>Resources</h3>"));
    assert!(flow.contains("downloadviewpdf"));
    let video = flow.find("<video").unwrap();
    let resources = flow.find("<h3>Resources</h3>").unwrap();
    assert!(video < resources);
}

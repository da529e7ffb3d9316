//! End-to-end tests for the dictation surface.
//!
//! Each test mounts its own surface from plain text, positions the live
//! selection through flat offsets, and checks the document and caret after
//! one or more fragments.

use std::sync::{Arc, Mutex};

use dictum_core::config::DictumConfig;
use dictum_core::types::{DegradedReason, FlatRange};
use dictum_editor::position::{to_flat_offsets, to_tree_range};
use dictum_editor::{
    spawn_surface, ContentChange, ContentNode, DictationSurface, ReplaceOutcome,
    StructuredContent, VoiceCommand,
};

// =============================================================================
// Helpers
// =============================================================================

fn surface(text: &str) -> DictationSurface {
    DictationSurface::with_content(&DictumConfig::default(), text)
}

fn dictate(text: &str, range: FlatRange, fragment: &str) -> DictationSurface {
    let mut surface = surface(text);
    surface.select(range);
    surface.insert_fragment(fragment);
    surface
}

// =============================================================================
// Position mapping
// =============================================================================

#[test]
fn test_flat_tree_round_trip_on_structured_document() {
    let content = StructuredContent {
        nodes: vec![
            ContentNode::Element {
                tag: "p".to_string(),
                children: vec![
                    ContentNode::Text {
                        text: "Findings: ".to_string(),
                    },
                    ContentNode::Element {
                        tag: "strong".to_string(),
                        children: vec![ContentNode::Text {
                            text: "normal".to_string(),
                        }],
                    },
                ],
            },
            ContentNode::LineBreak,
            ContentNode::LineBreak,
            ContentNode::Text {
                text: "Impression".to_string(),
            },
        ],
    };
    let surface = DictationSurface::with_content(&DictumConfig::default(), content);
    let doc = surface.document();
    let len = doc.flat_len();
    assert_eq!(len, 28);

    for start in 0..=len {
        for end in start..=len {
            let range = FlatRange::new(start, end);
            let tree = to_tree_range(doc, range);
            assert_eq!(to_flat_offsets(doc, &tree).unwrap(), range);
        }
    }
}

// =============================================================================
// Insertion scenarios
// =============================================================================

#[test]
fn test_partial_word_selection_replaces_whole_word() {
    let surface = dictate("intermediate grade lesion", FlatRange::new(2, 4), "X");
    assert_eq!(surface.get_plain_text(), "X grade lesion");
}

#[test]
fn test_boundary_only_spacing() {
    let surface = dictate("helloworld", FlatRange::caret(5), "test");
    assert_eq!(surface.get_plain_text(), "hello test world");
    assert_eq!(surface.caret(), Some(11));
}

#[test]
fn test_no_space_around_spoken_joiner() {
    let surface = dictate("low grade ", FlatRange::caret(10), "slash intermediate");
    assert_eq!(surface.get_plain_text(), "low grade/intermediate");
}

#[test]
fn test_caret_lands_after_inserted_text() {
    let surface = dictate("start middle end", FlatRange::new(6, 12), "center");
    assert_eq!(surface.get_plain_text(), "start center end");
    assert_eq!(surface.caret(), Some(12));
}

#[test]
fn test_joiner_replaces_selected_word() {
    let surface = dictate("low grade te lesion", FlatRange::new(10, 12), "slash intermediate");
    assert_eq!(surface.get_plain_text(), "low grade/intermediate lesion");
    assert_eq!(surface.caret(), Some(22));
}

#[test]
fn test_delete_that_removes_selected_span() {
    let mut surface = surface("no acute intracranial abnormality");
    surface.select(FlatRange::new(9, 22));
    let insertion = surface.insert_fragment("delete that");
    assert_eq!(insertion.command, Some(VoiceCommand::DeleteThat));
    assert_eq!(surface.get_plain_text(), "no acute abnormality");
    assert_eq!(surface.caret(), Some(9));
}

#[test]
fn test_dictation_session() {
    let mut surface = surface("");
    for chunk in [
        "findings",
        "new line",
        "the liver measures fifteen point five centimeters.",
        "no focal lesion",
        "scratch that",
        "mass",
        "new paragraph",
        "impression",
    ] {
        surface.insert_fragment(chunk);
    }
    assert_eq!(
        surface.get_plain_text(),
        "Findings\nThe liver measures 15.5 centimeters. No focal mass\n\nImpression"
    );
}

#[test]
fn test_fragment_with_line_break_and_numbers() {
    let surface = dictate("", FlatRange::caret(0), "Findings:\nliver measures two point five  cm");
    assert_eq!(surface.get_plain_text(), "Findings:\nliver measures 2.5  cm");
    assert_eq!(
        surface.get_structured_content().nodes,
        vec![
            ContentNode::Text {
                text: "Findings:".to_string(),
            },
            ContentNode::LineBreak,
            ContentNode::Text {
                text: "liver measures 2.5  cm".to_string(),
            },
        ]
    );
}

#[test]
fn test_long_multiplier_chain_does_not_stop_the_surface() {
    let mut surface = surface("");
    surface.insert_fragment(&"nine hundred ".repeat(40));
    let insertion = surface.insert_fragment("done");
    assert!(insertion.degraded.is_none());
    assert!(surface.get_plain_text().starts_with("909 hundred 909 hundred"));
    assert!(surface.get_plain_text().ends_with("hundred done"));
}

#[test]
fn test_structure_is_preserved_around_insertion() {
    let content = StructuredContent {
        nodes: vec![
            ContentNode::Element {
                tag: "p".to_string(),
                children: vec![ContentNode::Text {
                    text: "Liver normal.".to_string(),
                }],
            },
            ContentNode::Element {
                tag: "p".to_string(),
                children: vec![ContentNode::Text {
                    text: "Spleen normal.".to_string(),
                }],
            },
        ],
    };
    let mut surface = DictationSurface::with_content(&DictumConfig::default(), content);
    surface.select(FlatRange::caret(6));
    surface.insert_fragment("size");

    let content = surface.get_structured_content();
    assert_eq!(content.nodes.len(), 2);
    assert_eq!(content.to_plain_text(), "Liver size normal.Spleen normal.");
}

// =============================================================================
// Degraded paths
// =============================================================================

#[test]
fn test_stale_tracked_selection_appends_at_end() {
    let mut surface = surface("abc def");
    surface.select(FlatRange::caret(3));
    surface.blur();
    surface.replace_content("abc def ghi");

    let insertion = surface.insert_fragment("jkl");
    assert_eq!(insertion.degraded, Some(DegradedReason::StalePosition));
    assert_eq!(surface.get_plain_text(), "abc def ghi jkl");
}

#[test]
fn test_unknown_command_is_literal_text() {
    let surface = dictate("", FlatRange::caret(0), "delete everything");
    assert_eq!(surface.get_plain_text(), "Delete everything");
}

// =============================================================================
// Buffering
// =============================================================================

#[test]
fn test_replacement_during_insertion_applied_once_with_latest_content() {
    let mut surface = surface("draft");
    let changes: Arc<Mutex<Vec<ContentChange>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    surface.set_change_listener(Box::new(move |change| {
        sink.lock().unwrap().push(change.clone());
    }));
    surface.select(FlatRange::caret(5));

    surface.begin_insert("text");
    assert_eq!(surface.replace_content("report v1"), ReplaceOutcome::Deferred);
    assert_eq!(surface.replace_content("report v2"), ReplaceOutcome::Deferred);
    assert_eq!(surface.replace_content("report v3"), ReplaceOutcome::Deferred);
    surface.settle();

    assert_eq!(surface.get_plain_text(), "report v3");
    assert_eq!(surface.document().epoch(), 1);

    let texts: Vec<String> = changes
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.plain_text.clone())
        .collect();
    assert_eq!(texts, vec!["draft text".to_string(), "report v3".to_string()]);

    // Settling again does not reapply anything.
    surface.settle();
    assert_eq!(surface.document().epoch(), 1);
}

#[tokio::test]
async fn test_host_buffers_replacements_until_insertion_settles() {
    let (handle, task) = spawn_surface(surface("draft"));
    handle.select(FlatRange::caret(5)).unwrap();
    handle.submit_fragment("text").unwrap();
    handle.replace_content("report v1").unwrap();
    handle.replace_content("report v2").unwrap();

    assert_eq!(handle.plain_text().await.unwrap(), "report v2");

    handle.shutdown().unwrap();
    let surface = task.await.unwrap();
    assert_eq!(surface.document().epoch(), 1);
}

use std::collections::HashSet;

use bytes::Bytes;
use crate::common::{create_temp_file, default_session, node, replace_temp_file, sd};
use structscope::config::InspectorConfig;
use structscope::core::ByteRange;
use structscope::correlate::{Event, RecordingView, Session, ViewEvent};
use structscope::engine::CancelToken;
use structscope::error::InspectError;
use structscope::io::error::IoError;

#[test]
fn populate_feeds_view_parent_before_child() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();

    assert_eq!(view.events[0], ViewEvent::Reset);
    assert_eq!(view.events[1], ViewEvent::Bytes(40));
    assert_eq!(view.last_status(), Some("Loaded"));
    assert!(view.errors().is_empty());
    assert_eq!(
        &view.node_names()[..7],
        ["root", "flags", "reserved", "len_entries", "entries", "len_options", "options"]
    );

    let mut seen = HashSet::new();
    for event in &view.events {
        if let ViewEvent::Node { handle, parent, .. } = event {
            if let Some(parent) = parent {
                assert!(seen.contains(parent), "{} added before its parent", handle);
            }
            seen.insert(*handle);
        }
    }
    assert_eq!(seen.len(), session.tree().unwrap().len());
    assert_eq!(session.current_format(), Some("some_ip_sd"));
    assert_eq!(session.current_path(), Some(file.path()));
}

#[test]
fn unknown_format_is_reported() {
    let file = create_temp_file(b"\x01\x02");
    let mut session = default_session();
    let mut view = RecordingView::new();
    let err = session.populate(file.path(), "nope", &mut view).unwrap_err();
    assert!(matches!(err, InspectError::UnknownFormat(ref f) if f == "nope"));
    assert!(err.is_recoverable());
    assert_eq!(view.errors(), ["Unknown format: nope"]);
    assert!(session.tree().is_none());
}

#[test]
fn missing_file_is_fatal_and_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = default_session();
    let mut view = RecordingView::new();
    let err = session
        .populate(dir.path().join("absent.bin"), "raw", &mut view)
        .unwrap_err();
    assert!(matches!(err, InspectError::Io(IoError::StdIo(_))));
    assert!(!err.is_recoverable());
    assert!(view.events.is_empty());
}

#[test]
fn oversized_file_is_rejected() {
    let file = create_temp_file(&sd::offer_service());
    let mut config = InspectorConfig::default();
    config.io.max_file_size = 16;
    let mut session = Session::new(config);
    let err = session
        .populate(file.path(), "raw", &mut RecordingView::new())
        .unwrap_err();
    assert!(matches!(
        err,
        InspectError::Io(IoError::FileTooLarge {
            limit: 16,
            found: 40
        })
    ));
}

#[test]
fn failed_reload_keeps_previous_tree() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();
    let before = session.tree().unwrap().id();
    let entries = node(session.tree().unwrap(), "root.entries").handle;

    replace_temp_file(&file, &sd::truncated());
    view.clear();
    let err = session.dispatch(Event::Refresh, &mut view).unwrap_err();
    assert!(matches!(err, InspectError::Decode(_)));
    assert_eq!(view.events[0], ViewEvent::Status("Refreshing...".to_string()));
    assert_eq!(view.errors().len(), 1);
    assert!(view.errors()[0].contains("Truncated at offset 0x8"));
    assert!(!view.events.contains(&ViewEvent::Reset));

    // Tree and buffer are still the consistent pair from the first load
    assert_eq!(session.tree().unwrap().id(), before);
    assert_eq!(session.buffer().unwrap().len(), 40);
    assert_eq!(session.select(entries), Some(ByteRange { start: 8, end: 24 }));
}

#[test]
fn reload_replaces_tree_and_invalidates_handles() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();
    let old_shape = session.tree().unwrap().shape();
    let old_handle = node(session.tree().unwrap(), "root.len_entries").handle;

    view.clear();
    session.dispatch(Event::Refresh, &mut view).unwrap();
    assert_eq!(view.events[0], ViewEvent::Status("Refreshing...".to_string()));
    assert_eq!(view.last_status(), Some("Loaded"));

    assert_eq!(session.select(old_handle), None);
    assert_eq!(session.tree().unwrap().shape(), old_shape);
    let new_handle = node(session.tree().unwrap(), "root.len_entries").handle;
    assert_eq!(session.select(new_handle), Some(ByteRange { start: 4, end: 8 }));
}

#[test]
fn reload_picks_up_new_content() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();

    replace_temp_file(&file, &sd::two_subscriptions());
    session.reload(&mut view).unwrap();
    let tree = session.tree().unwrap();
    assert_eq!(node(tree, "root.entries.entries").description, "SdEntry[2]");
    assert_eq!(session.buffer().unwrap().len(), 44);
}

#[test]
fn selection_and_goto_events() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();
    let options = node(session.tree().unwrap(), "root.options").handle;
    let relative = node(session.tree().unwrap(), "root.options.options").handle;

    view.clear();
    session
        .dispatch(Event::StructureSelected(options), &mut view)
        .unwrap();
    session
        .dispatch(Event::StructureSelected(relative), &mut view)
        .unwrap();
    session.dispatch(Event::Goto(0x1c), &mut view).unwrap();
    assert_eq!(
        view.events,
        [
            ViewEvent::Highlight(ByteRange { start: 28, end: 40 }),
            ViewEvent::Scroll {
                offset: 28,
                emphasize: false
            },
            ViewEvent::Scroll {
                offset: 28,
                emphasize: true
            },
            ViewEvent::Status("Jumping to offset 0x1c (28)".to_string()),
        ]
    );
}

#[test]
fn default_format_is_raw() {
    let file = create_temp_file(b"hello");
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate_default(file.path(), &mut view).unwrap();
    let tree = session.tree().unwrap();
    assert_eq!(session.current_format(), Some("raw"));
    assert_eq!(node(tree, "root.data").description, "68656c6c6f (5 bytes)");
    assert_eq!(node(tree, "root.size").byte_range(), None);
}

#[test]
fn empty_file_decodes_as_raw() {
    let file = create_temp_file(b"");
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "raw", &mut view).unwrap();
    let data = node(session.tree().unwrap(), "root.data");
    assert_eq!(data.byte_range(), Some(ByteRange { start: 0, end: 0 }));
    assert!(view.events.contains(&ViewEvent::Bytes(0)));

    let err = session
        .populate(file.path(), "some_ip_sd", &mut view)
        .unwrap_err();
    assert!(matches!(err, InspectError::Decode(_)));
}

#[test]
fn cancelled_build_is_reported() {
    let file = create_temp_file(&sd::offer_service());
    let mut config = InspectorConfig::default();
    config.build.check_interval = 1;
    let token = CancelToken::new();
    let mut session = Session::new(config).with_cancel_token(token.clone());
    let mut view = RecordingView::new();
    token.cancel();

    let err = session
        .populate(file.path(), "some_ip_sd", &mut view)
        .unwrap_err();
    assert!(matches!(err, InspectError::Cancelled { nodes: 0 }));
    assert_eq!(view.errors().len(), 1);
    assert!(session.tree().is_none());
}

#[test]
fn retry_after_cancel_succeeds() {
    let file = create_temp_file(&sd::offer_service());
    let mut config = InspectorConfig::default();
    config.build.check_interval = 1;
    let token = CancelToken::new();
    let mut session = Session::new(config).with_cancel_token(token.clone());
    let mut view = RecordingView::new();

    token.cancel();
    let err = session
        .populate(file.path(), "some_ip_sd", &mut view)
        .unwrap_err();
    assert!(matches!(err, InspectError::Cancelled { .. }));
    assert!(session.tree().is_none());

    view.clear();
    session.dispatch(Event::Refresh, &mut view).unwrap();
    assert!(view.errors().is_empty());
    assert_eq!(view.last_status(), Some("Loaded"));
    let entries = node(session.tree().unwrap(), "root.entries").handle;
    assert_eq!(session.select(entries), Some(ByteRange { start: 8, end: 24 }));

    // The same token still cancels later builds
    token.cancel();
    let err = session.reload(&mut view).unwrap_err();
    assert!(matches!(err, InspectError::Cancelled { .. }));
    assert_eq!(session.select(entries), Some(ByteRange { start: 8, end: 24 }));
}

#[test]
fn populate_from_memory() {
    let mut session = default_session();
    let mut view = RecordingView::new();
    let data = Bytes::from(sd::offer_service());
    session
        .populate_memory(data.clone(), "some_ip_sd", &mut view)
        .unwrap();
    assert_eq!(view.events[1], ViewEvent::Bytes(40));
    assert_eq!(session.current_path(), None);
    assert_eq!(session.current_format(), Some("some_ip_sd"));
    assert_eq!(session.buffer().unwrap().origin(), "<memory>");

    let options = node(session.tree().unwrap(), "root.options").handle;
    assert_eq!(session.node_bytes(options).unwrap(), data.slice(28..40));
    let len_entries = node(session.tree().unwrap(), "root.len_entries").handle;
    assert_eq!(session.node_bytes(len_entries).unwrap(), &16u32.to_be_bytes()[..]);

    // Offsets inside the options substream are suppressed
    let relative = node(session.tree().unwrap(), "root.options.options").handle;
    assert_eq!(session.node_bytes(relative), None);

    session.dispatch(Event::Refresh, &mut view).unwrap();
    assert_eq!(session.select(options), None);
    assert_eq!(session.buffer().unwrap().len(), 40);
}

#[test]
fn memory_population_ignores_file_limit() {
    let mut config = InspectorConfig::default();
    config.io.max_file_size = 16;
    let mut session = Session::new(config);
    session
        .populate_memory(Bytes::from(sd::offer_service()), "raw", &mut RecordingView::new())
        .unwrap();
    let data = node(session.tree().unwrap(), "root.data").handle;
    assert_eq!(session.node_bytes(data).unwrap().len(), 40);
}

#[test]
fn file_node_bytes_follow_the_mapped_buffer() {
    let file = create_temp_file(b"hello");
    let mut session = default_session();
    session
        .populate(file.path(), "raw", &mut RecordingView::new())
        .unwrap();
    let data = node(session.tree().unwrap(), "root.data").handle;
    assert_eq!(session.node_bytes(data).unwrap(), &b"hello"[..]);
}

#[test]
fn node_limit_is_reported() {
    let file = create_temp_file(&sd::offer_service());
    let mut config = InspectorConfig::default();
    config.build.max_nodes = 10;
    let mut session = Session::new(config);
    let mut view = RecordingView::new();
    let err = session
        .populate(file.path(), "some_ip_sd", &mut view)
        .unwrap_err();
    assert!(matches!(
        err,
        InspectError::ResourceExhausted { limit: 10, .. }
    ));
    assert!(view.errors()[0].starts_with("Resource limit exceeded"));
}

use crate::common::{create_temp_file, default_session, node, sd};
use structscope::config::{InspectorConfig, RelativityPolicy};
use structscope::core::ByteRange;
use structscope::correlate::{RecordingView, Session};

#[test]
fn sd_entries_are_detected_as_relative() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    let mut view = RecordingView::new();
    session.populate(file.path(), "some_ip_sd", &mut view).unwrap();
    let tree = session.tree().unwrap();

    // The wrapper field is positioned in the outer message and is trusted
    let entries = node(tree, "root.entries");
    assert_eq!(entries.byte_range(), Some(ByteRange { start: 8, end: 24 }));
    assert!(!entries.offsets_invalid());

    // Everything decoded from the extracted slice is suppressed
    for path in [
        "root.entries.entries",
        "root.entries.entries.[0]",
        "root.entries.entries.[0].header",
        "root.entries.entries.[0].header.service_id",
        "root.entries.entries.[0].content.minor_version",
        "root.options.options.[0].content.address",
    ] {
        let n = node(tree, path);
        assert!(n.offsets_invalid(), "{} should be invalidated", path);
        assert_eq!((n.start, n.end), (None, None), "{}", path);
        assert_eq!(session.select(n.handle), None, "{}", path);
    }
}

#[test]
fn sd_header_fields_keep_absolute_offsets() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    session
        .populate(file.path(), "some_ip_sd", &mut RecordingView::new())
        .unwrap();
    let tree = session.tree().unwrap();

    let len_entries = node(tree, "root.len_entries").handle;
    assert_eq!(session.select(len_entries), Some(ByteRange { start: 4, end: 8 }));
    let len_options = node(tree, "root.len_options").handle;
    assert_eq!(session.select(len_options), Some(ByteRange { start: 24, end: 28 }));
    let options = node(tree, "root.options").handle;
    assert_eq!(session.select(options), Some(ByteRange { start: 28, end: 40 }));

    // Flags sit at offset 0 of the whole message, which is not suspicious
    let reboot = node(tree, "root.flags.reboot");
    assert!(!reboot.offsets_invalid());
    assert_eq!(reboot.start, Some(0));
}

#[test]
fn sd_pseudo_fields_have_no_range() {
    let file = create_temp_file(&sd::offer_service());
    let mut session = default_session();
    session
        .populate(file.path(), "some_ip_sd", &mut RecordingView::new())
        .unwrap();
    let tree = session.tree().unwrap();
    let text = node(tree, "root.options.options.[0].content.address_text");
    assert!(text.is_pseudo());
    assert_eq!(text.byte_range(), None);
    assert_eq!(text.description, "\"192.168.0.10\"");
}

#[test]
fn both_policies_suppress_relative_descendants() {
    let data = sd::two_subscriptions();
    let file = create_temp_file(&data);
    for policy in [RelativityPolicy::ChildOnly, RelativityPolicy::FollowingSiblings] {
        let mut config = InspectorConfig::default();
        config.build.relativity = policy;
        let mut session = Session::new(config);
        session
            .populate(file.path(), "some_ip_sd", &mut RecordingView::new())
            .unwrap();
        let tree = session.tree().unwrap();
        let group = node(tree, "root.entries.entries.[1].content.event_group_id");
        assert!(group.offsets_invalid(), "{:?}", policy);
        assert_eq!(group.description, "0x2 (2)");
        // entries array, 2 * (element + header + 9 + content + 5), options array
        assert_eq!(tree.invalidated_count(), 1 + 2 * 17 + 1);
    }
}

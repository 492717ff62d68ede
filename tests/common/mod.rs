//! Common test utilities and helpers.

use std::io::Write;
use tempfile::NamedTempFile;

use structscope::config::InspectorConfig;
use structscope::core::{StructureNode, StructureTree};
use structscope::correlate::Session;

/// Creates a temporary file with the given content.
///
/// The file is removed when the returned `NamedTempFile` is dropped.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Replace a temporary file with new content under the same path.
///
/// The old inode is left alone, so buffers still mapping it stay valid.
pub fn replace_temp_file(file: &NamedTempFile, content: &[u8]) {
    let staged = file.path().with_extension("staged");
    std::fs::write(&staged, content).unwrap();
    std::fs::rename(&staged, file.path()).unwrap();
}

/// A session with default configuration and the built-in formats.
pub fn default_session() -> Session {
    Session::new(InspectorConfig::default())
}

/// Look a node up by dotted path, panicking with the path on failure.
pub fn node<'t>(tree: &'t StructureTree, path: &str) -> &'t StructureNode {
    tree.find_path(path)
        .unwrap_or_else(|| panic!("no node at {}", path))
}

/// Sample SOME/IP service discovery payloads.
pub mod sd {
    /// One OfferService entry and one IPv4 endpoint option, 40 bytes.
    ///
    /// The entries array occupies bytes 8..24 and the options array 28..40.
    pub fn offer_service() -> Vec<u8> {
        let mut data = vec![0xc0, 0x00, 0x00, 0x00];
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(&[
            0x01, 0x00, 0x00, 0x10, 0x12, 0x34, 0x00, 0x01, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00,
            0x00, 0x0a,
        ]);
        data.extend_from_slice(&12u32.to_be_bytes());
        data.extend_from_slice(&[
            0x00, 0x09, 0x04, 0x00, 192, 168, 0, 10, 0x00, 0x11, 0x77, 0x2d,
        ]);
        data
    }

    /// Two SubscribeEventgroup entries and no options, 44 bytes.
    pub fn two_subscriptions() -> Vec<u8> {
        let mut data = vec![0x80, 0x00, 0x00, 0x00];
        data.extend_from_slice(&32u32.to_be_bytes());
        for eventgroup in [0x0001u16, 0x0002] {
            data.extend_from_slice(&[
                0x06, 0x00, 0x00, 0x00, 0x43, 0x21, 0x00, 0x01, 0x01, 0x00, 0x00, 0x05, 0x00,
                0x00,
            ]);
            data.extend_from_slice(&eventgroup.to_be_bytes());
        }
        data.extend_from_slice(&0u32.to_be_bytes());
        data
    }

    /// Header claims 16 bytes of entries but only 4 follow.
    pub fn truncated() -> Vec<u8> {
        let mut data = vec![0x00, 0x00, 0x00, 0x00];
        data.extend_from_slice(&16u32.to_be_bytes());
        data.extend_from_slice(&[0x01, 0x00, 0x00, 0x10]);
        data
    }
}

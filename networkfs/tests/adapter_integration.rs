//! Integration tests for the filesystem adapter.
//!
//! These tests drive [`NetworkFs`] against the in-memory service and check
//! the end-to-end behavior a host relies on:
//! - naming operations stay consistent with lookups
//! - directory iteration order and resumption
//! - content read/write limits
//!
//! Run with: `cargo test --test adapter_integration`

use networkfs::remote::MemoryRemote;
use networkfs::{
    AdapterOptions, DirEntry, FsError, MountContext, NetworkFs, Node, NodeKind, OversizePolicy,
    MAX_CONTENT, MAX_ENTRIES, ROOT_INODE,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn setup() -> (NetworkFs<MemoryRemote>, MountContext) {
    let remote = MemoryRemote::new().with_token("integration");
    let ctx = MountContext::mount("integration").unwrap();
    (NetworkFs::new(remote), ctx)
}

fn names(entries: &[DirEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name_lossy()).collect()
}

fn iterate_all(fs: &NetworkFs<MemoryRemote>, ctx: &MountContext, dir: Node) -> Vec<DirEntry> {
    let mut entries = Vec::new();
    fs.iterate_directory(ctx, dir, ROOT_INODE, 0, |entry, _| {
        entries.push(entry.clone());
        true
    })
    .unwrap();
    entries
}

// ============================================================================
// Naming
// ============================================================================

#[test]
fn test_create_then_lookup_agree() {
    let (fs, ctx) = setup();

    let file = fs
        .create_child(&ctx, fs.root(), b"report.txt", NodeKind::File)
        .unwrap();
    let dir = fs
        .create_child(&ctx, fs.root(), b"archive", NodeKind::Directory)
        .unwrap();

    assert_eq!(fs.lookup_child(&ctx, fs.root(), b"report.txt").unwrap(), file);
    assert_eq!(fs.lookup_child(&ctx, fs.root(), b"archive").unwrap(), dir);
    assert_ne!(file.inode(), dir.inode());
}

#[test]
fn test_names_with_reserved_characters_survive_transport() {
    let (fs, ctx) = setup();
    let name = "a b&c=d?e%g#h".as_bytes();

    let file = fs
        .create_child(&ctx, fs.root(), name, NodeKind::File)
        .unwrap();
    assert_eq!(fs.lookup_child(&ctx, fs.root(), name).unwrap(), file);

    let listed = iterate_all(&fs, &ctx, fs.root());
    assert_eq!(listed[2].name, name);
}

#[test]
fn test_name_with_slash_is_refused_by_service() {
    let (fs, ctx) = setup();

    let err = fs
        .create_child(&ctx, fs.root(), b"dir/file", NodeKind::File)
        .unwrap_err();
    assert!(err.is_remote());
    assert_eq!(iterate_all(&fs, &ctx, fs.root()).len(), 2);
}

#[test]
fn test_listed_unicode_name_can_be_removed() {
    let (fs, ctx) = setup();
    let name = "café".as_bytes();
    let file = fs
        .create_child(&ctx, fs.root(), name, NodeKind::File)
        .unwrap();

    let listed = iterate_all(&fs, &ctx, fs.root());
    assert_eq!(listed[2].name, name);

    assert_eq!(fs.lookup_child(&ctx, fs.root(), &listed[2].name).unwrap(), file);
    fs.remove_child(&ctx, fs.root(), &listed[2].name, NodeKind::File)
        .unwrap();
    assert_eq!(iterate_all(&fs, &ctx, fs.root()).len(), 2);
}

#[test]
fn test_non_utf8_name_is_refused_before_any_call() {
    let (fs, ctx) = setup();
    let name = b"caf\xe9";

    let err = fs
        .create_child(&ctx, fs.root(), name, NodeKind::File)
        .unwrap_err();
    assert!(matches!(err, FsError::InvalidName(_)));
    assert!(matches!(
        fs.lookup_child(&ctx, fs.root(), name).unwrap_err(),
        FsError::InvalidName(_)
    ));
    assert_eq!(iterate_all(&fs, &ctx, fs.root()).len(), 2);
}

#[test]
fn test_unlink_then_lookup_fails() {
    let (fs, ctx) = setup();
    fs.create_child(&ctx, fs.root(), b"gone", NodeKind::File)
        .unwrap();

    fs.remove_child(&ctx, fs.root(), b"gone", NodeKind::File)
        .unwrap();

    let err = fs.lookup_child(&ctx, fs.root(), b"gone").unwrap_err();
    assert!(err.is_remote());
}

#[test]
fn test_duplicate_create_is_remote_failure() {
    let (fs, ctx) = setup();
    fs.create_child(&ctx, fs.root(), b"x", NodeKind::File)
        .unwrap();
    let err = fs
        .create_child(&ctx, fs.root(), b"x", NodeKind::Directory)
        .unwrap_err();
    assert!(err.is_remote());
}

#[test]
fn test_rmdir_requires_empty_directory() {
    let (fs, ctx) = setup();
    let dir = fs
        .create_child(&ctx, fs.root(), b"d", NodeKind::Directory)
        .unwrap();
    fs.create_child(&ctx, dir, b"inner", NodeKind::File)
        .unwrap();

    assert!(fs
        .remove_child(&ctx, fs.root(), b"d", NodeKind::Directory)
        .is_err());

    fs.remove_child(&ctx, dir, b"inner", NodeKind::File)
        .unwrap();
    fs.remove_child(&ctx, fs.root(), b"d", NodeKind::Directory)
        .unwrap();
    assert!(fs.lookup_child(&ctx, fs.root(), b"d").is_err());
}

#[test]
fn test_link_shares_content() {
    let (fs, ctx) = setup();
    let dir = fs
        .create_child(&ctx, fs.root(), b"d", NodeKind::Directory)
        .unwrap();
    let file = fs
        .create_child(&ctx, fs.root(), b"orig", NodeKind::File)
        .unwrap();
    fs.write_content(&ctx, file, 0, b"shared").unwrap();

    fs.link_child(&ctx, file, dir, b"alias").unwrap();

    let alias = fs.lookup_child(&ctx, dir, b"alias").unwrap();
    assert_eq!(alias, file);

    // Removing one name keeps the other.
    fs.remove_child(&ctx, fs.root(), b"orig", NodeKind::File)
        .unwrap();
    assert_eq!(fs.read_content(&ctx, alias, 0, 64).unwrap(), b"shared");
}

// ============================================================================
// Iteration
// ============================================================================

#[test]
fn test_iteration_yields_dot_entries_then_children_in_order() {
    let (fs, ctx) = setup();
    for name in ["c", "a", "b"] {
        fs.create_child(&ctx, fs.root(), name.as_bytes(), NodeKind::File)
            .unwrap();
    }

    let entries = iterate_all(&fs, &ctx, fs.root());
    assert_eq!(names(&entries), vec![".", "..", "c", "a", "b"]);
    assert_eq!(entries[0].kind, NodeKind::Directory);
    assert_eq!(entries[1].kind, NodeKind::Directory);
}

#[test]
fn test_iteration_past_end_leaves_cursor_unchanged() {
    let (fs, ctx) = setup();
    fs.create_child(&ctx, fs.root(), b"only", NodeKind::File)
        .unwrap();

    let first = fs
        .iterate_directory(&ctx, fs.root(), ROOT_INODE, 0, |_, _| true)
        .unwrap();
    assert_eq!(first.cursor, 3);
    assert_eq!(first.emitted, 3);

    let again = fs
        .iterate_directory(&ctx, fs.root(), ROOT_INODE, first.cursor, |_, _| true)
        .unwrap();
    assert_eq!(again.cursor, 3);
    assert_eq!(again.emitted, 0);
}

#[test]
fn test_iteration_resumes_after_full_buffer() {
    let (fs, ctx) = setup();
    for name in ["a", "b", "c"] {
        fs.create_child(&ctx, fs.root(), name.as_bytes(), NodeKind::File)
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut budget = 2;
    let outcome = fs
        .iterate_directory(&ctx, fs.root(), ROOT_INODE, 0, |entry, _| {
            if budget == 0 {
                return false;
            }
            budget -= 1;
            seen.push(entry.name_lossy());
            true
        })
        .unwrap();
    assert_eq!(outcome.cursor, 2);

    fs.iterate_directory(&ctx, fs.root(), ROOT_INODE, outcome.cursor, |entry, _| {
        seen.push(entry.name_lossy());
        true
    })
    .unwrap();
    assert_eq!(seen, vec![".", "..", "a", "b", "c"]);
}

#[test]
fn test_large_directory_is_clipped_to_page_limit() {
    let (fs, ctx) = setup();
    let dir = fs
        .create_child(&ctx, fs.root(), b"big", NodeKind::Directory)
        .unwrap();
    for i in 0..MAX_ENTRIES + 4 {
        fs.create_child(&ctx, dir, format!("f{:02}", i).as_bytes(), NodeKind::File)
            .unwrap();
    }

    let entries = iterate_all(&fs, &ctx, dir);
    assert_eq!(entries.len(), MAX_ENTRIES + 2);
    assert_eq!(entries.last().unwrap().name_lossy(), "f15");
}

// ============================================================================
// Content
// ============================================================================

#[test]
fn test_write_then_read_round_trip() {
    let (fs, ctx) = setup();
    let file = fs
        .create_child(&ctx, fs.root(), b"f", NodeKind::File)
        .unwrap();

    let data: Vec<u8> = (0u8..=255).collect();
    assert_eq!(fs.write_content(&ctx, file, 0, &data).unwrap(), data.len());
    assert_eq!(fs.read_content(&ctx, file, 0, 1024).unwrap(), data);
    assert_eq!(fs.content_len(&ctx, file).unwrap(), 256);
}

#[test]
fn test_read_is_clipped_to_stored_length() {
    let (fs, ctx) = setup();
    let file = fs
        .create_child(&ctx, fs.root(), b"f", NodeKind::File)
        .unwrap();
    fs.write_content(&ctx, file, 0, b"0123456789").unwrap();

    assert_eq!(fs.read_content(&ctx, file, 4, 100).unwrap(), b"456789");
    assert_eq!(fs.read_content(&ctx, file, 10, 5).unwrap(), b"");
    assert_eq!(fs.read_content(&ctx, file, 50, 5).unwrap(), b"");
}

#[test]
fn test_oversize_write_is_truncated_by_default() {
    let (fs, ctx) = setup();
    let file = fs
        .create_child(&ctx, fs.root(), b"f", NodeKind::File)
        .unwrap();

    let written = fs.write_content(&ctx, file, 0, &[7u8; 600]).unwrap();
    assert_eq!(written, MAX_CONTENT);
    assert_eq!(fs.content_len(&ctx, file).unwrap(), MAX_CONTENT);
}

#[test]
fn test_oversize_write_can_be_rejected() {
    let remote = MemoryRemote::new();
    let ctx = MountContext::mount("tok").unwrap();
    let fs = NetworkFs::with_options(
        remote,
        AdapterOptions {
            oversize: OversizePolicy::Reject,
        },
    );
    let file = fs
        .create_child(&ctx, fs.root(), b"f", NodeKind::File)
        .unwrap();
    fs.write_content(&ctx, file, 0, b"keep").unwrap();

    let err = fs.write_content(&ctx, file, 0, &[1u8; 600]).unwrap_err();
    assert!(matches!(err, FsError::SizeLimitExceeded { .. }));
    assert_eq!(fs.read_content(&ctx, file, 0, 64).unwrap(), b"keep");
}

#[test]
fn test_truncate_empties_file() {
    let (fs, ctx) = setup();
    let file = fs
        .create_child(&ctx, fs.root(), b"f", NodeKind::File)
        .unwrap();
    fs.write_content(&ctx, file, 0, b"data").unwrap();

    fs.truncate_content(&ctx, file).unwrap();
    assert_eq!(fs.content_len(&ctx, file).unwrap(), 0);
}

// ============================================================================
// Mount context
// ============================================================================

#[test]
fn test_wrong_token_fails_every_call() {
    let remote = MemoryRemote::new().with_token("right");
    let fs = NetworkFs::new(remote);
    let ctx = MountContext::mount("wrong").unwrap();

    assert!(fs
        .create_child(&ctx, fs.root(), b"x", NodeKind::File)
        .unwrap_err()
        .is_remote());
    ctx.unmount();
}

mod common;

use bytes::Bytes;
use converter_engine::{unpack, unpack_with_limit, ArchiveError};
use pretty_assertions::assert_eq;

use common::{png_bytes, zip_bytes};

#[test]
fn yields_images_in_archive_order_and_skips_the_rest() {
    let png = png_bytes(2, 2);
    let zip = zip_bytes(&[
        ("x/", &b""[..]),
        ("x/1.png", &png[..]),
        ("readme.txt", &b"hello"[..]),
        ("2.PNG", &png[..]),
        ("x/deeper/3.jpeg", &b"not really a jpeg"[..]),
    ]);

    let entries: Vec<_> = unpack(Bytes::from(zip))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, ["x/1.png", "2.PNG", "x/deeper/3.jpeg"]);
    assert_eq!(entries[0].file_name(), "1.png");
    assert_eq!(entries[0].bytes.as_ref(), png.as_slice());
}

#[test]
fn traversal_entries_are_dropped() {
    let png = png_bytes(1, 1);
    let zip = zip_bytes(&[("../escape.png", &png[..]), ("ok/fine.png", &png[..])]);

    let paths: Vec<_> = unpack(Bytes::from(zip))
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, ["ok/fine.png"]);
}

#[test]
fn oversized_entries_are_skipped() {
    let zip = zip_bytes(&[("big.png", &[0u8; 64][..]), ("small.png", &[0u8; 8][..])]);

    let paths: Vec<_> = unpack_with_limit(Bytes::from(zip), 16)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path)
        .collect();
    assert_eq!(paths, ["small.png"]);
}

/// Overwrite every declared uncompressed size (local and central headers).
fn understate_sizes(zip: &mut [u8], declared: u32) {
    let local = [0x50, 0x4B, 0x03, 0x04];
    let central = [0x50, 0x4B, 0x01, 0x02];
    for start in 0..zip.len().saturating_sub(4) {
        let offset = if zip[start..start + 4] == local {
            22
        } else if zip[start..start + 4] == central {
            24
        } else {
            continue;
        };
        zip[start + offset..start + offset + 4].copy_from_slice(&declared.to_le_bytes());
    }
}

#[test]
fn entries_that_inflate_past_the_limit_are_not_yielded_whole() {
    let mut zip = zip_bytes(&[("bomb.png", &[7u8; 4096][..]), ("small.png", &[1u8; 8][..])]);
    understate_sizes(&mut zip, 8);

    let entries: Vec<_> = unpack_with_limit(Bytes::from(zip), 16)
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert!(entries.iter().all(|entry| entry.bytes.len() <= 16));
}

#[test]
fn corrupt_archive_is_unreadable() {
    let err = unpack(Bytes::from_static(b"PK\x03\x04 this is not a zip")).err();
    assert!(matches!(err, Some(ArchiveError::Unreadable(_))));
}

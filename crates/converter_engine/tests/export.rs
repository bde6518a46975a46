mod common;

use converter_core::{
    update, AppState, Effect, InputFile, ItemId, ItemOrigin, Msg, NewItem, Preview, SourceImage,
    TargetFormat,
};
use converter_engine::{
    export_all_as_archive, export_all_flat, export_one, ExportError, RenderSurface,
};
use pretty_assertions::assert_eq;

use common::{png_bytes, zip_names};

fn jpeg() -> TargetFormat {
    "jpeg".parse().unwrap()
}

fn item(name: &str, origin: ItemOrigin) -> NewItem {
    let bytes = png_bytes(2, 2);
    NewItem {
        source: SourceImage {
            name: name.to_string(),
            bytes: bytes.clone().into(),
        },
        original_preview: Preview::new("image/png", bytes),
        origin,
    }
}

fn from_archive(path: &str) -> NewItem {
    item(
        path.rsplit('/').next().unwrap(),
        ItemOrigin::Archive {
            path: path.to_string(),
        },
    )
}

/// Ingest `items` and convert the ones at `convert` with a real surface.
fn state_with(items: Vec<NewItem>, convert: &[usize], target: TargetFormat) -> (AppState, Vec<ItemId>) {
    let (state, _) = update(AppState::new(), Msg::SurfaceReady);
    let (state, effects) = update(
        state,
        Msg::InputsAdded(vec![InputFile::new("fixture", Vec::<u8>::new(), None)]),
    );
    let batch_id = match effects.as_slice() {
        [Effect::Ingest { batch_id, .. }] => *batch_id,
        other => panic!("unexpected effects {other:?}"),
    };
    let (mut state, _) = update(
        state,
        Msg::IngestFinished {
            batch_id,
            items,
            issues: Vec::new(),
        },
    );
    let ids: Vec<_> = state.repository().iter().map(|item| item.id).collect();

    let mut surface = RenderSurface::new();
    for &index in convert {
        let (next, effects) = update(
            state,
            Msg::ConvertOneRequested {
                id: ids[index],
                target,
            },
        );
        let job = match effects.as_slice() {
            [Effect::Convert(job)] => job.clone(),
            other => panic!("unexpected effects {other:?}"),
        };
        let result = surface
            .render(&job.source.bytes, job.hint, job.target)
            .map_err(|err| err.to_string());
        let (next, _) = update(next, Msg::ConversionFinished { id: job.id, result });
        state = next;
    }
    (state, ids)
}

#[test]
fn export_one_names_output_after_source_stem() {
    let (state, ids) = state_with(vec![item("logo.png", ItemOrigin::Loose)], &[0], jpeg());

    let blob = export_one(state.repository(), ids[0], jpeg()).unwrap();
    assert_eq!(blob.name, "logo_converted.jpeg");
    assert_eq!(blob.mime, "image/jpeg");
    assert_eq!(&blob.bytes[..3], &[0xFFu8, 0xD8, 0xFF]);
}

#[test]
fn export_one_requires_conversion() {
    let (state, ids) = state_with(vec![item("logo.png", ItemOrigin::Loose)], &[], jpeg());

    assert_eq!(
        export_one(state.repository(), ids[0], jpeg()),
        Err(ExportError::NotConverted(ids[0]))
    );
    let before = state.repository().clone();
    let _ = export_one(state.repository(), ids[0], jpeg());
    assert_eq!(state.repository(), &before);
}

#[test]
fn flat_export_skips_unconverted_and_ignores_directories() {
    let (state, _) = state_with(
        vec![
            item("a.png", ItemOrigin::Loose),
            from_archive("photos/b.png"),
            item("c.png", ItemOrigin::Loose),
        ],
        &[0, 1],
        jpeg(),
    );

    let names: Vec<_> = export_all_flat(state.repository(), jpeg())
        .into_iter()
        .map(|blob| blob.name)
        .collect();
    assert_eq!(names, ["a_converted.jpeg", "b_converted.jpeg"]);
}

#[test]
fn archive_export_rebuilds_directories() {
    let (state, _) = state_with(
        vec![
            from_archive("photos/vacation/img1.png"),
            item("logo.png", ItemOrigin::Loose),
            from_archive("root.png"),
        ],
        &[0, 1, 2],
        jpeg(),
    );

    let blob = export_all_as_archive(state.repository(), jpeg())
        .unwrap()
        .expect("archive");
    assert_eq!(blob.name, "converted_images_jpeg.zip");
    assert_eq!(
        zip_names(&blob.bytes),
        [
            "photos/vacation/img1_converted.jpeg",
            "logo_converted.jpeg",
            "root_converted.jpeg",
        ]
    );
}

#[test]
fn archive_export_with_nothing_converted_is_none() {
    let (state, _) = state_with(vec![item("a.png", ItemOrigin::Loose)], &[], jpeg());
    assert_eq!(export_all_as_archive(state.repository(), jpeg()), Ok(None));
}

#[test]
fn colliding_archive_paths_keep_one_entry() {
    let (state, _) = state_with(
        vec![from_archive("dir/a.png"), from_archive("dir/a.gif")],
        &[0, 1],
        jpeg(),
    );

    let blob = export_all_as_archive(state.repository(), jpeg())
        .unwrap()
        .expect("archive");
    assert_eq!(zip_names(&blob.bytes), ["dir/a_converted.jpeg"]);
}

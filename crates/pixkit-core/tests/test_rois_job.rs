mod common;

use pixkit_core::error::PixkitError;
use pixkit_core::jobs::params::{DataType, ImagesFromRoisParams};
use pixkit_core::jobs::{run_images_from_rois, NoOpReporter};
use pixkit_core::pixels::{PlaneCoord, Tile};
use pixkit_core::roi::Shape;

use common::{rect, MemoryGateway, Recorder};

fn params(ids: Vec<u64>, stack: bool) -> ImagesFromRoisParams {
    ImagesFromRoisParams {
        ids,
        make_image_stack: stack,
        ..Default::default()
    }
}

fn tile(x: u32, y: u32, width: u32, height: u32) -> Tile {
    Tile {
        x,
        y,
        width,
        height,
    }
}

#[test]
fn test_stack_from_three_rois() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("data/cells.tif", 20, 20, 3, 1, 1);
    let dataset = gw.add_dataset("raw", true, &[src.id]);
    gw.add_roi(src.id, vec![rect(0.0, 0.0, 4.0, 4.0, 0, 0)]);
    gw.add_roi(src.id, vec![rect(5.0, 6.0, 4.0, 4.0, 1, 0)]);
    gw.add_roi(src.id, vec![rect(10.0, 12.0, 4.0, 4.0, 2, 0)]);

    let outcome = run_images_from_rois(&gw, &params(vec![src.id], true), &NoOpReporter).unwrap();

    assert_eq!(outcome.images.len(), 1);
    let stack = outcome.result().unwrap();
    assert_eq!(stack.name, "cells.tif_From_ROIs");
    assert_eq!((stack.size_x, stack.size_y), (4, 4));
    assert_eq!((stack.size_z, stack.size_c, stack.size_t), (3, 1, 1));
    assert_eq!(stack.physical_size_x, Some(0.1));
    assert_eq!(
        stack.description,
        format!(
            "Image from ROIS on parent Image:\n  Name: data/cells.tif\n  Image ID: {}",
            src.id
        )
    );

    let expected = [
        (0, tile(0, 0, 4, 4)),
        (1, tile(5, 6, 4, 4)),
        (2, tile(10, 12, 4, 4)),
    ];
    for (z, (src_z, t)) in expected.iter().enumerate() {
        let plane = gw.stored_plane(stack.id, PlaneCoord::new(z, 0, 0));
        let source = gw
            .stored_plane(src.id, PlaneCoord::new(*src_z, 0, 0))
            .crop(t)
            .unwrap();
        assert_eq!(plane, source, "stack plane {z}");
    }

    assert!(gw.dataset_members(dataset.id).contains(&stack.id));
    assert!(outcome.datasets.is_empty());
    assert_eq!(outcome.message, "Created a new image.");
}

#[test]
fn test_stack_without_container_name() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("cells", 20, 20, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(0.0, 0.0, 4.0, 4.0, 0, 0)]);
    let mut p = params(vec![src.id], true);
    p.container_name = None;

    let outcome = run_images_from_rois(&gw, &p, &NoOpReporter).unwrap();
    assert_eq!(outcome.result().unwrap().name, "cells");
    assert_eq!(
        outcome.message,
        "Created a new image but some images could not be attached."
    );
}

#[test]
fn test_per_roi_image_spans_z_and_channels() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("cells", 16, 12, 3, 2, 1);
    let dataset = gw.add_dataset("raw", true, &[src.id]);
    let project = gw.add_project("study", true, &[dataset.id]);
    gw.add_roi(
        src.id,
        vec![rect(2.0, 3.0, 5.0, 4.0, 0, 0), rect(2.0, 3.0, 5.0, 4.0, 2, 0)],
    );

    let outcome = run_images_from_rois(&gw, &params(vec![src.id], false), &NoOpReporter).unwrap();

    let created = outcome.result().unwrap();
    assert_eq!(created.name, "cells");
    assert_eq!((created.size_x, created.size_y), (5, 4));
    assert_eq!((created.size_z, created.size_c, created.size_t), (3, 2, 1));
    assert_eq!(
        created.description,
        format!(
            "Created from image:\n  Name: cells\n  Image ID: {} \n x: 2 y: 3",
            src.id
        )
    );

    let requested: Vec<PlaneCoord> = gw.tile_requests.borrow().iter().map(|r| r.1).collect();
    assert_eq!(
        requested,
        vec![
            PlaneCoord::new(0, 0, 0),
            PlaneCoord::new(0, 1, 0),
            PlaneCoord::new(1, 0, 0),
            PlaneCoord::new(1, 1, 0),
            PlaneCoord::new(2, 0, 0),
            PlaneCoord::new(2, 1, 0),
        ]
    );
    for z in 0..3 {
        for c in 0..2 {
            let coord = PlaneCoord::new(z, c, 0);
            assert_eq!(
                gw.stored_plane(created.id, coord),
                gw.stored_plane(src.id, coord)
                    .crop(&tile(2, 3, 5, 4))
                    .unwrap()
            );
        }
    }

    let container = &outcome.datasets[0];
    assert_eq!(container.name, "From_ROIs");
    assert_eq!(
        container.description,
        format!(
            "Images in this Dataset are from ROIs of parent Image:\n  Name: cells\n  Image ID: {}",
            src.id
        )
    );
    assert_eq!(gw.dataset_members(container.id), vec![created.id]);
    assert!(gw.project_members(project.id).contains(&container.id));
    assert_eq!(outcome.links, 1);
    assert_eq!(outcome.message, "Created a new image and a new dataset.");
}

#[test]
fn test_roi_clamped_to_image() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("edge", 12, 25, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(-5.0, 0.0, 20.0, 20.0, 0, 0)]);

    let outcome = run_images_from_rois(&gw, &params(vec![src.id], false), &NoOpReporter).unwrap();
    let created = outcome.result().unwrap();
    assert_eq!((created.size_x, created.size_y), (12, 20));
    assert_eq!(gw.tile_requests.borrow()[0].2, tile(0, 0, 12, 20));
}

#[test]
fn test_roi_outside_image_skipped() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("edge", 10, 10, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(50.0, 50.0, 5.0, 5.0, 0, 0)]);
    gw.add_roi(src.id, vec![rect(1.0, 1.0, 2.0, 2.0, 0, 0)]);

    let outcome = run_images_from_rois(&gw, &params(vec![src.id], false), &NoOpReporter).unwrap();
    assert_eq!(outcome.images.len(), 1);
    assert_eq!(gw.tile_requests.borrow().len(), 1);

    let lost = MemoryGateway::new();
    let img = lost.add_image("edge", 10, 10, 1, 1, 1);
    lost.add_roi(img.id, vec![rect(50.0, 50.0, 5.0, 5.0, 0, 0)]);
    let outcome = run_images_from_rois(&lost, &params(vec![img.id], false), &NoOpReporter).unwrap();
    assert!(outcome.images.is_empty());
    assert_eq!(outcome.message, "No image created.");
}

#[test]
fn test_roi_far_outside_image_skipped() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("edge", 10, 10, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(1e19, 0.0, 10.0, 10.0, 0, 0)]);

    let outcome = run_images_from_rois(&gw, &params(vec![src.id], false), &NoOpReporter).unwrap();
    assert!(outcome.images.is_empty());
    assert!(gw.tile_requests.borrow().is_empty());
    assert_eq!(outcome.message, "No image created.");
}

#[test]
fn test_stack_tile_outside_image_fails() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("cells", 20, 20, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(0.0, 0.0, 8.0, 8.0, 0, 0)]);
    gw.add_roi(src.id, vec![rect(15.0, 15.0, 4.0, 4.0, 0, 0)]);

    let recorder = Recorder::default();
    let err = run_images_from_rois(&gw, &params(vec![src.id], true), &recorder).unwrap_err();
    assert!(matches!(err, PixkitError::TileOutOfBounds { .. }));
    assert!(gw.created.borrow().is_empty());
    assert!(recorder
        .events
        .borrow()
        .contains(&"begin Planes Some(2)".to_string()));
    assert_eq!(recorder.events.borrow().last().unwrap(), "finish");
}

#[test]
fn test_no_rectangle_roi() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("round", 10, 10, 1, 1, 1);
    gw.add_roi(
        src.id,
        vec![Shape::Ellipse {
            x: 5.0,
            y: 5.0,
            radius_x: 2.0,
            radius_y: 2.0,
            z: 0,
            t: 0,
        }],
    );
    let outcome = run_images_from_rois(&gw, &params(vec![src.id], true), &NoOpReporter).unwrap();
    assert!(outcome.images.is_empty());
    assert_eq!(outcome.message, "No rectangle ROI found.");
    assert!(gw.created.borrow().is_empty());
}

#[test]
fn test_missing_images() {
    let gw = MemoryGateway::new();
    let outcome = run_images_from_rois(&gw, &params(vec![41, 42], false), &NoOpReporter).unwrap();
    assert_eq!(outcome.message, "No images found. ");
    assert!(outcome.elapsed_secs >= 0.0);
}

#[test]
fn test_no_container_links_to_parent() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("cells", 20, 20, 1, 1, 1);
    let dataset = gw.add_dataset("raw", true, &[src.id]);
    gw.add_roi(src.id, vec![rect(0.0, 0.0, 4.0, 4.0, 0, 0)]);
    gw.add_roi(src.id, vec![rect(8.0, 8.0, 6.0, 3.0, 0, 0)]);
    let mut p = params(vec![src.id], false);
    p.container_name = Some("".into());

    let outcome = run_images_from_rois(&gw, &p, &NoOpReporter).unwrap();
    assert_eq!(outcome.images.len(), 2);
    assert!(outcome.datasets.is_empty());
    let members = gw.dataset_members(dataset.id);
    for image in &outcome.images {
        assert!(members.contains(&image.id));
    }
    assert_eq!(outcome.message, "Created 2 new images.");
}

#[test]
fn test_orphans_without_dataset() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("loose", 20, 20, 1, 1, 1);
    gw.add_roi(src.id, vec![rect(0.0, 0.0, 4.0, 4.0, 0, 0)]);
    let mut p = params(vec![src.id], false);
    p.container_name = None;

    let outcome = run_images_from_rois(&gw, &p, &NoOpReporter).unwrap();
    assert_eq!(outcome.links, 0);
    assert_eq!(
        outcome.message,
        "Created a new image but some images could not be attached."
    );
}

#[test]
fn test_dataset_ids_expand_per_image() {
    let gw = MemoryGateway::new();
    let a = gw.add_image("a", 10, 10, 1, 1, 1);
    let b = gw.add_image("b", 10, 10, 1, 1, 1);
    let dataset = gw.add_dataset("pair", true, &[a.id, b.id]);
    gw.add_roi(a.id, vec![rect(0.0, 0.0, 3.0, 3.0, 0, 0)]);
    gw.add_roi(b.id, vec![rect(1.0, 1.0, 3.0, 3.0, 0, 0)]);
    let mut p = params(vec![dataset.id], false);
    p.data_type = DataType::Dataset;

    let outcome = run_images_from_rois(&gw, &p, &NoOpReporter).unwrap();
    assert_eq!(outcome.images.len(), 2);
    assert_eq!(outcome.datasets.len(), 2);
    assert_eq!(outcome.message, "Created 2 new images and 2 new datasets.");
}

#[test]
fn test_time_range_follows_rectangles() {
    let gw = MemoryGateway::new();
    let src = gw.add_image("movie", 10, 10, 1, 2, 4);
    gw.add_roi(
        src.id,
        vec![rect(0.0, 0.0, 2.0, 2.0, 0, 1), rect(0.0, 0.0, 2.0, 2.0, 0, 3)],
    );
    let outcome = run_images_from_rois(&gw, &params(vec![src.id], false), &NoOpReporter).unwrap();
    let created = outcome.result().unwrap();
    assert_eq!((created.size_z, created.size_c, created.size_t), (1, 2, 3));
    assert_eq!(
        gw.stored_plane(created.id, PlaneCoord::new(0, 1, 0)),
        gw.stored_plane(src.id, PlaneCoord::new(0, 1, 1))
            .crop(&tile(0, 0, 2, 2))
            .unwrap()
    );
}

//! Concurrent image intake.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use keepsake_core::images::{IncomingFile, RejectionReason};
use keepsake_integration_tests::{ScriptedIntake, TSHIRT, png, test_state};

fn names(prefix: &str, count: usize) -> Vec<IncomingFile> {
    (0..count).map(|i| png(&format!("{prefix}{i}.png"))).collect()
}

#[tokio::test]
async fn test_batches_apply_whole_and_respect_cap() {
    let state = test_state(Arc::new(ScriptedIntake::accepting()));
    let product = state.products().product(TSHIRT).await.unwrap();
    let flow = state.open_flow(product).await;

    let (a, b) = tokio::join!(
        flow.add_images(names("a", 3)),
        flow.add_images(names("b", 3))
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.accepted.len() + b.accepted.len(), 5);
    assert_eq!(a.rejections.len() + b.rejections.len(), 1);
    let rejected = a.rejections.iter().chain(&b.rejections).next().unwrap();
    assert!(matches!(rejected.reason, RejectionReason::LimitReached { .. }));

    // Each batch lands contiguously and in upload order.
    let filenames: Vec<String> = flow
        .read(|w| {
            w.session()
                .images()
                .ordered()
                .into_iter()
                .map(|image| image.filename.clone())
                .collect()
        })
        .await;
    let expected_first = if filenames[0].starts_with('a') {
        ["a0.png", "a1.png", "a2.png", "b0.png", "b1.png"]
    } else {
        ["b0.png", "b1.png", "b2.png", "a0.png", "a1.png"]
    };
    assert_eq!(filenames, expected_first);
}

#[tokio::test]
async fn test_bad_files_are_reported_not_fatal() {
    let state = test_state(Arc::new(ScriptedIntake::accepting()));
    let product = state.products().product(TSHIRT).await.unwrap();
    let flow = state.open_flow(product).await;

    let files = vec![
        png("ok.png"),
        IncomingFile::new("notes.txt", Some("text/plain"), b"hello".to_vec()),
        IncomingFile::new("huge.jpg", Some("image/jpeg"), vec![0; 6 * 1024 * 1024]),
        IncomingFile::new("photo.webp", None, vec![1, 2, 3]),
    ];
    let report = flow.add_images(files).await.unwrap();

    assert_eq!(report.accepted.len(), 2);
    let reasons: Vec<(&str, &RejectionReason)> = report
        .rejections
        .iter()
        .map(|r| (r.filename.as_str(), &r.reason))
        .collect();
    assert_eq!(reasons.len(), 2);
    assert_eq!(reasons[0].0, "notes.txt");
    assert!(matches!(reasons[0].1, RejectionReason::UnsupportedType { .. }));
    assert_eq!(reasons[1].0, "huge.jpg");
    assert!(matches!(reasons[1].1, RejectionReason::FileTooLarge { .. }));

    let removed = flow
        .edit(|w| w.remove_image(report.accepted[0]))
        .await
        .unwrap();
    assert_eq!(removed.unwrap().filename, "ok.png");
    assert_eq!(flow.read(|w| w.session().images().len()).await, 1);
}

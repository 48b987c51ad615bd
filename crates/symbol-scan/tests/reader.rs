use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use symbol_scan::{
    CharacterClassifier, Classification, ClassificationError, DetectionError, EmptyRegionPolicy,
    NormalizedQuad, Point, ReadError, ReaderOptions, RegionDetector, SkipReason, SymbolReader,
    TextRegion,
};

const WIDTH: u32 = 100;
const HEIGHT: u32 = 20;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Serves the same regions for every image.
struct ScriptedDetector {
    regions: Vec<TextRegion>,
}

impl RegionDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&self, _image: &RgbaImage) -> Result<Vec<TextRegion>, DetectionError> {
        Ok(self.regions.clone())
    }
}

struct FailingDetector;

impl RegionDetector for FailingDetector {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn detect(&self, _image: &RgbaImage) -> Result<Vec<TextRegion>, DetectionError> {
        Err(DetectionError::Vision("request failed".into()))
    }
}

/// Labels a crop by the colour at its centre: red, green and blue read as
/// `A`, `B` and `C`; black fails; gray yields no candidates.
#[derive(Default)]
struct ColorClassifier {
    calls: AtomicUsize,
}

/// Coarse channel level, tolerant of interpolation rounding.
fn level(value: u8) -> u8 {
    match value {
        0..=59 => 0,
        100..=160 => 1,
        200..=255 => 2,
        _ => 9,
    }
}

impl CharacterClassifier for ColorClassifier {
    fn name(&self) -> &'static str {
        "color"
    }

    fn classify(&self, image: &RgbaImage) -> Result<Vec<Classification>, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let [r, g, b, _] = image.get_pixel(image.width() / 2, image.height() / 2).0;
        match (level(r), level(g), level(b)) {
            (2, 0, 0) => Ok(vec![Classification::new("A", 0.9), Classification::new("4", 0.1)]),
            (0, 2, 0) => Ok(vec![Classification::new("B", 0.8)]),
            (0, 0, 2) => Ok(vec![Classification::new("C", 0.7)]),
            (0, 0, 0) => Err(ClassificationError::backend("unreadable glyph")),
            (1, 1, 1) => Ok(Vec::new()),
            other => Err(ClassificationError::backend(format!(
                "unexpected colour levels {other:?}"
            ))),
        }
    }
}

/// Unit box over pixel columns `x..x+10`, rows `5..15`.
fn slot(x: u32) -> NormalizedQuad {
    NormalizedQuad::from_rect(
        x as f32 / WIDTH as f32,
        5.0 / HEIGHT as f32,
        10.0 / WIDTH as f32,
        10.0 / HEIGHT as f32,
    )
}

/// White canvas with one coloured 10x10 block per `(x, colour)`.
fn canvas(blocks: &[(u32, Rgba<u8>)]) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(WIDTH, HEIGHT, WHITE);
    for &(x0, colour) in blocks {
        for y in 5..15 {
            for x in x0..x0 + 10 {
                image.put_pixel(x, y, colour);
            }
        }
    }
    image
}

fn reader_for(regions: Vec<TextRegion>) -> (SymbolReader, Arc<ColorClassifier>) {
    let classifier = Arc::new(ColorClassifier::default());
    let reader = SymbolReader::new(
        Arc::new(ScriptedDetector { regions }),
        Arc::clone(&classifier) as Arc<dyn CharacterClassifier>,
    );
    (reader, classifier)
}

#[tokio::test(flavor = "multi_thread")]
async fn no_regions_yield_no_words() {
    let (reader, classifier) = reader_for(Vec::new());
    let prediction = reader.read(Arc::new(canvas(&[]))).await.unwrap();
    assert!(prediction.is_empty());
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn characters_concatenate_in_box_order() {
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(10), slot(30), slot(50)])]);
    let image = canvas(&[(10, RED), (30, GREEN), (50, BLUE)]);

    let prediction = reader.read(Arc::new(image)).await.unwrap();
    assert_eq!(prediction.names(), vec!["ABC"]);
    let word = &prediction.words()[0];
    assert_eq!(word.characters.len(), 3);
    assert_eq!(word.characters[0].confidence, 0.9);
    assert_eq!(word.characters[2].box_index, 2);
    assert!(prediction.is_complete());
}

#[tokio::test(flavor = "multi_thread")]
async fn one_word_per_region_in_detection_order() {
    let (reader, _) = reader_for(vec![
        TextRegion::new(vec![slot(50)]),
        TextRegion::new(vec![slot(10)]),
        TextRegion::new(vec![slot(30)]),
    ]);
    let image = canvas(&[(10, RED), (30, GREEN), (50, BLUE)]);

    let prediction = reader.read(Arc::new(image)).await.unwrap();
    assert_eq!(prediction.names(), vec!["C", "A", "B"]);
    let indices: Vec<usize> = prediction.words().iter().map(|w| w.region_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn out_of_bounds_box_is_skipped() {
    let overflowing = NormalizedQuad::from_rect(0.95, 0.25, 0.1, 0.5);
    let (reader, classifier) = reader_for(vec![TextRegion::new(vec![
        slot(10),
        overflowing,
        slot(50),
    ])]);
    let image = canvas(&[(10, RED), (50, BLUE)]);

    let prediction = reader.read(Arc::new(image)).await.unwrap();
    assert_eq!(prediction.names(), vec!["AC"]);
    let word = &prediction.words()[0];
    assert_eq!(word.skipped.len(), 1);
    assert_eq!(word.skipped[0].box_index, 1);
    assert_eq!(word.skipped[0].reason, SkipReason::OutOfBounds);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn classifier_failures_are_recorded_and_reading_continues() {
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(10), slot(30), slot(50), slot(70)])]);
    let image = canvas(&[(10, RED), (30, BLACK), (50, GRAY), (70, BLUE)]);

    let prediction = reader.read(Arc::new(image)).await.unwrap();
    assert_eq!(prediction.names(), vec!["AC"]);
    assert!(!prediction.is_complete());

    let skipped = &prediction.words()[0].skipped;
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].box_index, 1);
    assert!(matches!(
        &skipped[0].reason,
        SkipReason::Classification(message) if message.contains("unreadable glyph")
    ));
    assert_eq!(skipped[1].box_index, 2);
    assert_eq!(skipped[1].reason, SkipReason::NoResult);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_regions_follow_policy() {
    let regions = vec![
        TextRegion::new(vec![slot(10)]),
        TextRegion::new(Vec::new()),
        TextRegion::new(vec![NormalizedQuad::from_rect(-0.1, 0.0, 0.2, 0.5)]),
    ];
    let image = Arc::new(canvas(&[(10, GREEN)]));

    let (keeping, _) = reader_for(regions.clone());
    let kept = keeping.read(Arc::clone(&image)).await.unwrap();
    assert_eq!(kept.names(), vec!["B", ""]);
    let indices: Vec<usize> = kept.words().iter().map(|w| w.region_index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(kept.words()[1].skipped[0].reason, SkipReason::OutOfBounds);

    let omitting = SymbolReader::with_options(
        Arc::new(ScriptedDetector { regions }),
        Arc::new(ColorClassifier::default()),
        ReaderOptions {
            empty_regions: EmptyRegionPolicy::Omit,
        },
    );
    let omitted = omitting.read(image).await.unwrap();
    assert_eq!(omitted.names(), vec!["B"]);
    assert_eq!(omitted.words()[0].region_index, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn regions_without_boxes_produce_no_word() {
    let (reader, classifier) = reader_for(vec![TextRegion::new(Vec::new()), TextRegion::default()]);
    let prediction = reader.read(Arc::new(canvas(&[]))).await.unwrap();
    assert!(prediction.is_empty());
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn collapsed_box_is_skipped_as_unrectifiable() {
    let collapsed = NormalizedQuad::new(
        Point::new(0.1, 0.25),
        Point::new(0.2, 0.5),
        Point::new(0.3, 0.75),
        Point::new(0.15, 0.375),
    );
    let (reader, classifier) = reader_for(vec![TextRegion::new(vec![collapsed, slot(50)])]);
    let image = canvas(&[(10, RED), (20, RED), (50, BLUE)]);

    let prediction = reader.read(Arc::new(image)).await.unwrap();
    assert_eq!(prediction.names(), vec!["C"]);
    let skipped = &prediction.words()[0].skipped;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].box_index, 0);
    assert!(matches!(skipped[0].reason, SkipReason::Rectification(_)));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn detection_failure_fails_the_read() {
    let reader = SymbolReader::new(Arc::new(FailingDetector), Arc::new(ColorClassifier::default()));
    let err = reader.read(Arc::new(canvas(&[]))).await.unwrap_err();
    assert!(matches!(
        err,
        ReadError::Detection(DetectionError::Vision(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reads_do_not_share_state() {
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(10), slot(30), slot(50)])]);
    let forward = Arc::new(canvas(&[(10, RED), (30, GREEN), (50, BLUE)]));
    let backward = Arc::new(canvas(&[(10, BLUE), (30, GREEN), (50, RED)]));

    let mut tasks = Vec::new();
    for index in 0..16 {
        let reader = reader.clone();
        let (image, expected) = if index % 2 == 0 {
            (Arc::clone(&forward), "ABC")
        } else {
            (Arc::clone(&backward), "CBA")
        };
        tasks.push(tokio::spawn(async move {
            let prediction = reader.read(image).await.unwrap();
            (prediction.names().join(" "), expected)
        }));
    }

    for task in tasks {
        let (actual, expected) = task.await.unwrap();
        assert_eq!(actual, expected);
    }
}

#[test]
fn submit_delivers_once_on_the_given_runtime() {
    let delivery = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("symbol-delivery")
        .enable_all()
        .build()
        .unwrap();
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(10), slot(30)])]);
    let deliveries = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let counter = Arc::clone(&deliveries);
    let handle = reader.submit(
        Arc::new(canvas(&[(10, GREEN), (30, RED)])),
        delivery.handle(),
        move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let thread = std::thread::current().name().map(str::to_owned);
            let names = result.map(|prediction| prediction.names().join(" "));
            tx.send((thread, names.map_err(|err| err.to_string()))).unwrap();
        },
    );

    let (thread, names) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    delivery.block_on(handle).unwrap();
    assert_eq!(thread.as_deref(), Some("symbol-delivery"));
    assert_eq!(names.unwrap(), "BA");
    assert_eq!(deliveries.load(Ordering::SeqCst), 1);
    assert!(rx.try_recv().is_err());
}

#[test]
fn concurrent_submits_deliver_their_own_results() {
    let delivery = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(10), slot(30), slot(50)])]);
    let forward = Arc::new(canvas(&[(10, RED), (30, GREEN), (50, BLUE)]));
    let backward = Arc::new(canvas(&[(10, BLUE), (30, GREEN), (50, RED)]));
    let (tx, rx) = mpsc::channel();

    let mut handles = Vec::new();
    for index in 0..12usize {
        let image = if index % 2 == 0 {
            Arc::clone(&forward)
        } else {
            Arc::clone(&backward)
        };
        let tx = tx.clone();
        handles.push(reader.submit(image, delivery.handle(), move |result| {
            let names = result.map(|prediction| prediction.names().join(" "));
            tx.send((index, names.map_err(|err| err.to_string()))).unwrap();
        }));
    }
    drop(tx);

    let mut delivered = vec![0usize; 12];
    for _ in 0..12 {
        let (index, names) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let expected = if index % 2 == 0 { "ABC" } else { "CBA" };
        assert_eq!(names.unwrap(), expected);
        delivered[index] += 1;
    }
    for handle in handles {
        delivery.block_on(handle).unwrap();
    }
    assert!(delivered.iter().all(|count| *count == 1));
    assert!(rx.try_recv().is_err());
}

#[test]
fn read_blocking_matches_async_read() {
    let (reader, _) = reader_for(vec![TextRegion::new(vec![slot(30)])]);
    let prediction = reader.read_blocking(&canvas(&[(30, BLUE)])).unwrap();
    assert_eq!(prediction.names(), vec!["C"]);
}

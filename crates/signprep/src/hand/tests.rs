use std::cell::Cell;

use signprep_image::Resolution;

use super::*;

struct Fixed {
    hands: Option<Vec<RawHand>>,
    calls: Cell<u32>,
}

impl Fixed {
    fn new(hands: Option<Vec<RawHand>>) -> Self {
        Self {
            hands,
            calls: Cell::new(0),
        }
    }
}

impl LandmarkBackend for Fixed {
    fn infer(&self, _frame: &Image) -> anyhow::Result<Option<Vec<RawHand>>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.hands.clone())
    }
}

fn raw_hand(x0: f32, y0: f32) -> RawHand {
    RawHand {
        landmarks: (0..NUM_LANDMARKS)
            .map(|i| {
                let i = i as f32;
                [x0 + i * 4.0 + 0.7, y0 + i * 5.0 + 0.2, -i * 0.5]
            })
            .collect(),
    }
}

#[test]
fn missing_results_mean_no_hands() {
    let landmarker = HandLandmarker::new(Fixed::new(None), HandConfig::default());
    let frame = Image::filled(Resolution::new(64, 48), Color::BLACK);

    let out = landmarker.detect(&frame, true).unwrap();
    assert!(out.hands.is_empty());
    let bone = out.bone.unwrap();
    assert_eq!(bone.resolution(), frame.resolution());
    assert!(bone.pixels().all(|c| c == Color::WHITE));

    let out = landmarker.detect(&frame, false).unwrap();
    assert!(out.bone.is_none());
    assert_eq!(landmarker.backend.calls.get(), 2);
}

#[test]
fn truncates_landmarks() {
    let landmarker = HandLandmarker::new(
        Fixed::new(Some(vec![raw_hand(100.0, 100.0)])),
        HandConfig::default(),
    );
    let frame = Image::filled(Resolution::square(320), Color::BLACK);

    let out = landmarker.detect(&frame, false).unwrap();
    assert_eq!(out.hands.len(), 1);
    let hand = &out.hands[0];
    assert_eq!(hand.landmarks().len(), NUM_LANDMARKS);
    assert_eq!(hand.landmarks()[0], [100, 100, 0]);
    // Depth truncates towards zero.
    assert_eq!(hand.zs()[1], 0);
    assert_eq!(hand.zs()[2], -1);
    assert_eq!(hand.xs()[20], 180);
    assert_eq!(hand.ys()[20], 200);
    assert_eq!(
        hand.bounding_box(),
        BoundingBox {
            x: 100,
            y: 100,
            width: 80,
            height: 100,
        }
    );
    assert_eq!(hand.extents()[2], Extent { min: -10, max: 0 });
}

#[test]
fn caps_hand_count() {
    let raw = vec![raw_hand(0.0, 0.0), raw_hand(10.0, 0.0), raw_hand(20.0, 0.0)];
    let config = HandConfig {
        max_hands: 2,
        ..HandConfig::default()
    };
    let landmarker = HandLandmarker::new(Fixed::new(Some(raw)), config);
    let frame = Image::filled(Resolution::square(320), Color::BLACK);

    let out = landmarker.detect(&frame, false).unwrap();
    assert_eq!(out.hands.len(), 2);
    assert_eq!(out.hands[1].bounding_box().x, 10);
}

#[test]
fn renders_skeleton_on_white() {
    let hand = HandObservation::from_raw(&raw_hand(100.0, 100.0));
    let frame = Image::filled(Resolution::square(320), Color::BLACK);
    let bone = render_bones(&frame, &[hand.clone()]);

    // Landmarks are red dots.
    let [x, y, _] = hand.landmarks()[0];
    assert_eq!(bone.get(x as u32, y as u32), Color::RED);
    // Far away from the hand, the canvas stays white.
    assert_eq!(bone.get(10, 10), Color::WHITE);
    assert_eq!(bone.get(300, 300), Color::WHITE);
    // Somewhere along the thumb's first bone, the connection color shows up.
    assert!(bone.pixels().any(|c| c == BONE_COLOR));
}

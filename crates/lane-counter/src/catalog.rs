//! Detector class catalog

use std::collections::HashSet;
use crate::CounterError;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear",
    "hair drier", "toothbrush",
];

/// Class names in detector id order
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    names: Vec<String>,
}

impl ClassCatalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The 80 COCO labels used by YOLO-family detectors
    pub fn coco() -> Self {
        Self::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    pub fn name(&self, class_id: u32) -> Option<&str> {
        self.names.get(class_id as usize).map(String::as_str)
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        let name = canonical(name);
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&name))
            .map(|i| i as u32)
    }

    /// Map configured class names to detector ids
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<HashSet<u32>, CounterError> {
        names
            .iter()
            .map(|n| {
                self.id(n.as_ref())
                    .ok_or_else(|| CounterError::UnknownClass(n.as_ref().to_string()))
            })
            .collect()
    }
}

fn canonical(name: &str) -> String {
    match name.trim().to_ascii_lowercase().as_str() {
        "motorbike" => "motorcycle".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_vehicle_ids() {
        let catalog = ClassCatalog::coco();
        let ids = catalog.resolve(&["car", "motorbike", "Bus", "truck"]).unwrap();

        assert_eq!(ids, HashSet::from([2, 3, 5, 7]));
        assert_eq!(catalog.name(7), Some("truck"));
        assert_eq!(catalog.name(80), None);
    }

    #[test]
    fn test_unknown_class() {
        let catalog = ClassCatalog::coco();
        assert_eq!(
            catalog.resolve(&["car", "tank"]),
            Err(CounterError::UnknownClass("tank".to_string()))
        );
    }
}

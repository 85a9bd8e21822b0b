use crate::fusion::{Finding, FusedResult};

/// Horizontal position of an object in the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Left,
    InFront,
    Right,
}

impl Position {
    /// Classify by the horizontal center of a normalized box.
    pub fn from_center_x(center_x: f32) -> Self {
        if center_x < 0.33 {
            Position::Left
        } else if center_x > 0.66 {
            Position::Right
        } else {
            Position::InFront
        }
    }

    pub fn phrase(self) -> &'static str {
        match self {
            Position::Left => "to the left",
            Position::InFront => "in front",
            Position::Right => "to the right",
        }
    }
}

/// Render one finding, e.g. `A chair is 85.3 centimetres to the left.`
pub fn clause(finding: &Finding) -> String {
    let position = Position::from_center_x(finding.detection.bbox.mid_x());
    format!(
        "A {} is {:.1} centimetres {}.",
        finding.detection.label,
        finding.distance.centimetres(),
        position.phrase()
    )
}

/// One sentence for the whole result, clauses in result order. `None` when empty.
pub fn build_sentence(result: &FusedResult) -> Option<String> {
    if result.is_empty() {
        return None;
    }
    let clauses: Vec<String> = result.findings.iter().map(clause).collect();
    Some(clauses.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::Distance;
    use crate::detect::Detection;
    use crate::frame::NormalizedRect;

    fn finding(label: &str, x: f32, w: f32, cm: f64) -> Finding {
        Finding {
            detection: Detection::new(label, 0.9, NormalizedRect::new(x, 0.4, w, 0.2)),
            distance: Distance::from_centimetres(cm).unwrap(),
        }
    }

    #[test]
    fn position_thresholds() {
        assert_eq!(Position::from_center_x(0.0), Position::Left);
        assert_eq!(Position::from_center_x(0.329), Position::Left);
        assert_eq!(Position::from_center_x(0.33), Position::InFront);
        assert_eq!(Position::from_center_x(0.5), Position::InFront);
        assert_eq!(Position::from_center_x(0.66), Position::InFront);
        assert_eq!(Position::from_center_x(0.661), Position::Right);
    }

    #[test]
    fn chair_on_the_left() {
        let result = FusedResult::new(1, vec![finding("chair", 0.1, 0.2, 85.3)]);
        assert_eq!(
            build_sentence(&result).unwrap(),
            "A chair is 85.3 centimetres to the left."
        );
    }

    #[test]
    fn clauses_join_with_single_space() {
        let result = FusedResult::new(
            7,
            vec![
                finding("person", 0.4, 0.2, 120.04),
                finding("door", 0.8, 0.1, 301.27),
            ],
        );
        assert_eq!(
            build_sentence(&result).unwrap(),
            "A person is 120.0 centimetres in front. A door is 301.3 centimetres to the right."
        );
    }

    #[test]
    fn empty_result_has_no_sentence() {
        assert_eq!(build_sentence(&FusedResult::new(0, vec![])), None);
    }
}

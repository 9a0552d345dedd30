use crate::classify::PARAGRAPH_BREAK;
use crate::{CumulativeNotes, TierTexts};

/// Build cumulative notes: medium repeats easy, hard repeats easy and medium.
pub fn aggregate(texts: &TierTexts) -> CumulativeNotes {
    let medium = [texts.easy.as_str(), texts.medium.as_str()].join(PARAGRAPH_BREAK);
    let hard = [medium.as_str(), texts.hard.as_str()].join(PARAGRAPH_BREAK);
    CumulativeNotes {
        easy: texts.easy.clone(),
        medium,
        hard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> TierTexts {
        TierTexts {
            easy: "Easy one. Easy two.\n\nEasy three.".into(),
            medium: "Medium one.".into(),
            hard: "Hard one.".into(),
        }
    }

    #[test]
    fn test_cumulative_layout() {
        let notes = aggregate(&texts());
        assert_eq!(notes.easy, "Easy one. Easy two.\n\nEasy three.");
        assert_eq!(notes.medium, "Easy one. Easy two.\n\nEasy three.\n\nMedium one.");
        assert_eq!(
            notes.hard,
            "Easy one. Easy two.\n\nEasy three.\n\nMedium one.\n\nHard one."
        );
    }

    #[test]
    fn test_harder_tiers_contain_easier_blocks_in_order() {
        let t = texts();
        let notes = aggregate(&t);
        assert!(notes.medium.starts_with(&t.easy));
        assert!(notes.hard.starts_with(&notes.medium));
        let easy_at = notes.hard.find(&t.easy).unwrap();
        let medium_at = notes.hard.find(&t.medium).unwrap();
        let hard_at = notes.hard.find(&t.hard).unwrap();
        assert!(easy_at < medium_at && medium_at < hard_at);
    }

    #[test]
    fn test_placeholders_carry_through() {
        let notes = aggregate(&TierTexts::placeholders());
        assert!(notes.hard.contains("Foundational overview."));
        assert!(notes.hard.ends_with("Advanced structural implications."));
    }
}

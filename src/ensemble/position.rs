//! Offset resolution for retained texts.

use rustc_hash::FxHashSet;

use crate::taggers::EntityMention;

use super::CanonicalEntity;
use super::voting::RetainedText;

/// Copies `start`/`end` onto each retained text from the raw tagger
/// mentions.
///
/// Tagger outputs are scanned in registry order: the first tagger is the
/// preferred position source and the rest are fallbacks. Every positioned
/// mention whose text matches contributes one entity, so a text occurring
/// at several offsets yields one entity per occurrence. Exact
/// `(start, end, label)` triples are emitted only once. Mentions without
/// positions never contribute; a retained text with no positioned mention
/// produces no entity at all.
#[must_use]
pub fn assign_positions(
    winners: &[RetainedText],
    outputs: &[Vec<EntityMention>],
) -> Vec<CanonicalEntity> {
    let mut entities = Vec::new();
    let mut seen: FxHashSet<(usize, usize, String)> = FxHashSet::default();

    for winner in winners {
        for mentions in outputs {
            for mention in mentions {
                if mention.text != winner.text {
                    continue;
                }
                let (Some(start), Some(end)) = (mention.start, mention.end) else {
                    continue;
                };
                if !seen.insert((start, end, winner.label.clone())) {
                    continue;
                }
                entities.push(CanonicalEntity {
                    text: winner.text.clone(),
                    label: winner.label.clone(),
                    start,
                    end,
                });
            }
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner(text: &str, label: &str) -> RetainedText {
        RetainedText {
            text: text.to_string(),
            label: label.to_string(),
        }
    }

    fn entity(text: &str, label: &str, start: usize, end: usize) -> CanonicalEntity {
        CanonicalEntity {
            text: text.to_string(),
            label: label.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn positions_come_from_the_first_matching_source() {
        let winners = vec![winner("Renault", "ORG")];
        let outputs = vec![
            vec![EntityMention::new("Renault", "ORG").with_span(10, 17)],
            vec![EntityMention::new("Renault", "ORG").with_span(10, 17)],
        ];

        assert_eq!(
            assign_positions(&winners, &outputs),
            vec![entity("Renault", "ORG", 10, 17)]
        );
    }

    #[test]
    fn fallback_source_supplies_missing_positions() {
        let winners = vec![winner("Renault", "ORG")];
        let outputs = vec![
            vec![EntityMention::new("Renault", "ORG")],
            vec![EntityMention::new("Renault", "ORG").with_span(10, 17)],
        ];

        assert_eq!(
            assign_positions(&winners, &outputs),
            vec![entity("Renault", "ORG", 10, 17)]
        );
    }

    #[test]
    fn unpositioned_mentions_never_reach_the_output() {
        let winners = vec![winner("Renault", "ORG")];
        let outputs = vec![
            vec![EntityMention::new("Renault", "ORG")],
            vec![EntityMention::new("Renault", "ORG").with_score(0.9)],
        ];

        assert!(assign_positions(&winners, &outputs).is_empty());
    }

    #[test]
    fn each_occurrence_yields_its_own_entity() {
        let winners = vec![winner("Renault", "ORG")];
        let outputs = vec![vec![
            EntityMention::new("Renault", "ORG").with_span(10, 17),
            EntityMention::new("Renault", "ORG").with_span(42, 49),
        ]];

        assert_eq!(
            assign_positions(&winners, &outputs),
            vec![
                entity("Renault", "ORG", 10, 17),
                entity("Renault", "ORG", 42, 49),
            ]
        );
    }

    #[test]
    fn winning_label_overrides_the_source_mention_label() {
        // The vote decided ORG; a fallback source that tagged the same span
        // as LOC still only contributes its offsets.
        let winners = vec![winner("Bretagne", "ORG")];
        let outputs = vec![
            vec![EntityMention::new("Bretagne", "ORG").with_span(3, 11)],
            vec![EntityMention::new("Bretagne", "LOC").with_span(3, 11)],
        ];

        assert_eq!(
            assign_positions(&winners, &outputs),
            vec![entity("Bretagne", "ORG", 3, 11)]
        );
    }

    #[test]
    fn entities_follow_winner_order_then_source_order() {
        let winners = vec![winner("Renault", "ORG"), winner("Nantes", "LOC")];
        let outputs = vec![
            vec![EntityMention::new("Nantes", "LOC").with_span(20, 26)],
            vec![EntityMention::new("Renault", "ORG").with_span(0, 7)],
        ];

        assert_eq!(
            assign_positions(&winners, &outputs),
            vec![
                entity("Renault", "ORG", 0, 7),
                entity("Nantes", "LOC", 20, 26),
            ]
        );
    }
}

//! Per-text-per-label majority voting over tagger mention lists.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::taggers::EntityMention;

/// A mention text that cleared the majority threshold, paired with its
/// vote-winning label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedText {
    pub text: String,
    pub label: String,
}

#[derive(Debug)]
struct LabelTally {
    label: String,
    voters: FxHashSet<usize>,
}

#[derive(Debug)]
struct TextTally {
    text: String,
    labels: Vec<LabelTally>,
}

/// Tallies `(text, label)` votes across tagger outputs and returns the
/// retained texts with their winning labels.
///
/// A text is retained iff at least one of its labels reaches
/// `ceil(N / 2)` votes, where `N` is the number of taggers. Each tagger
/// contributes at most one vote per `(text, label)` pair, no matter how
/// often it repeats the pair. The winning label is the one with the most
/// votes; on a tie the label that was first encountered wins, scanning
/// taggers in registry order and mentions in emission order. Output order
/// is first-discovery order of texts, never a sort.
#[must_use]
pub fn majority_vote(outputs: &[Vec<EntityMention>]) -> Vec<RetainedText> {
    let threshold = outputs.len().div_ceil(2);

    let mut tallies: Vec<TextTally> = Vec::new();
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();

    for (voter, mentions) in outputs.iter().enumerate() {
        for mention in mentions {
            let slot = *slots.entry(mention.text.clone()).or_insert_with(|| {
                tallies.push(TextTally {
                    text: mention.text.clone(),
                    labels: Vec::new(),
                });
                tallies.len() - 1
            });
            let labels = &mut tallies[slot].labels;
            let position = labels
                .iter()
                .position(|tally| tally.label == mention.label)
                .unwrap_or_else(|| {
                    labels.push(LabelTally {
                        label: mention.label.clone(),
                        voters: FxHashSet::default(),
                    });
                    labels.len() - 1
                });
            labels[position].voters.insert(voter);
        }
    }

    let mut retained = Vec::new();
    for tally in tallies {
        if !tally
            .labels
            .iter()
            .any(|label| label.voters.len() >= threshold)
        {
            continue;
        }

        let mut winner: Option<&LabelTally> = None;
        for label in &tally.labels {
            // Strict comparison keeps the first-encountered label on ties.
            if winner.is_none_or(|current| label.voters.len() > current.voters.len()) {
                winner = Some(label);
            }
        }
        if let Some(winner) = winner {
            retained.push(RetainedText {
                text: tally.text,
                label: winner.label.clone(),
            });
        }
    }

    retained
}

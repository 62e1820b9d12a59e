// tests/classifier_properties.rs
//
// Behavioural properties of the lexicon classifier over a hand-picked
// corpus of headlines plus a few constructed edge cases.

use news_sentiment_ingest::sentiment::{classify, score, SentimentLabel};

const CORPUS: &[&str] = &[
    "",
    "the cat sat on the mat",
    "Ceasefire agreement brings peace to the region. Leaders signed a historic truce today.",
    "Missile strikes kill dozens in overnight attack",
    "The crisis was severe last year. Now the economy is recovering and hope is growing!",
    "This is not a great success",
    "No violence was reported during the march.",
    "peace and war",
    "Talks collapse?! Fear spreads... Markets tumble.",
    "Aid arrives. Relief for families. Hospitals reopen. Celebration in the streets!!!",
    "The tragedy of the earthquake devastated the town, but rescue teams will rebuild.",
];

#[test]
fn classify_is_deterministic() {
    for t in CORPUS {
        let a = classify(t);
        let b = classify(t);
        assert_eq!(a.label, b.label, "{t:?}");
        assert_eq!(a.confidence.to_bits(), b.confidence.to_bits(), "{t:?}");
    }
}

#[test]
fn confidence_stays_within_bounds() {
    let long = "Great victory and peace. ".repeat(100);
    let mut inputs: Vec<&str> = CORPUS.to_vec();
    inputs.push(&long);
    for t in inputs {
        let r = classify(t);
        match r.label {
            SentimentLabel::Positive | SentimentLabel::Negative => {
                assert!(
                    (0.5..=0.95).contains(&r.confidence),
                    "{t:?} -> {}",
                    r.confidence
                );
            }
            SentimentLabel::Neutral => {
                assert!(
                    r.confidence == 0.6 || r.confidence == 0.7,
                    "{t:?} -> {}",
                    r.confidence
                );
            }
        }
    }
}

#[test]
fn empty_and_lexicon_free_text_is_neutral_low_signal() {
    for t in ["", "the cat sat on the mat"] {
        let r = classify(t);
        assert_eq!(r.label, SentimentLabel::Neutral);
        assert_eq!(r.confidence, 0.7);
    }
}

#[test]
fn negation_shifts_the_outcome() {
    let plain = score("This is a great success");
    let negated = score("This is not a great success");
    assert!(negated.positive < plain.positive);
    assert!(negated.negative > plain.negative);
    assert_eq!(classify("This is a great success").label, SentimentLabel::Positive);
    assert_ne!(
        classify("This is not a great success").label,
        SentimentLabel::Positive
    );
}

#[test]
fn near_equal_polarity_is_neutral() {
    // "peace" and "war" carry the same weight in one sentence.
    let s = score("peace and war");
    assert!(s.positive > 0.0 && s.negative > 0.0);
    assert!(s.positive <= s.negative * 1.2 && s.negative <= s.positive * 1.2);
    let r = classify("peace and war");
    assert_eq!(r.label, SentimentLabel::Neutral);
    assert_eq!(r.confidence, 0.6);
}

#[test]
fn ceasefire_headline_is_confidently_positive() {
    let r = classify(
        "Ceasefire agreement brings peace to the region Leaders signed a historic truce today.",
    );
    assert_eq!(r.label, SentimentLabel::Positive);
    assert!(r.confidence >= 0.7, "confidence {}", r.confidence);
}

#[test]
fn conflict_headline_is_negative() {
    let r = classify("Missile strikes kill dozens in overnight attack");
    assert_eq!(r.label, SentimentLabel::Negative);
}

#[test]
fn classifier_is_safe_to_share_across_threads() {
    let expected: Vec<_> = CORPUS.iter().map(|t| classify(t)).collect();
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| CORPUS.iter().map(|t| classify(t)).collect::<Vec<_>>()))
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

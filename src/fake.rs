//! Random catalog records for the simulation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

const ADJECTIVES: &[&str] = &["Rustic", "Sleek", "Ergonomic", "Handmade", "Small", "Refined"];
const MATERIALS: &[&str] = &["Wooden", "Steel", "Cotton", "Granite", "Bronze", "Plastic"];
const THINGS: &[&str] = &["Lamp", "Chair", "Table", "Keyboard", "Bottle", "Shoes"];
const WORDS: &[&str] = &[
    "quality", "sturdy", "light", "works", "great", "value", "arrived", "late", "would", "buy",
    "again", "colour", "matches", "photo",
];

fn id<R: Rng>(rng: &mut R) -> String {
    format!("{:016x}", rng.gen::<u64>())
}

fn pick<R: Rng>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

fn sentence<R: Rng>(rng: &mut R, len: usize) -> String {
    let words: Vec<&str> = (0..len).map(|_| pick(rng, WORDS)).collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

/// A product without its nested collections.
pub fn product<R: Rng>(rng: &mut R) -> Value {
    json!({
        "id": id(rng),
        "name": format!("{} {} {}", pick(rng, ADJECTIVES), pick(rng, MATERIALS), pick(rng, THINGS)),
        "price": format!("{:.2}", rng.gen_range(1.0..500.0)),
        "description": sentence(rng, 12),
        "rating": rng.gen_range(1..=5),
    })
}

pub fn review<R: Rng>(rng: &mut R) -> Value {
    json!({
        "id": id(rng),
        "comment": sentence(rng, 6),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_product_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let product = product(&mut rng);
        for field in ["id", "name", "price", "description", "rating"] {
            assert!(product.get(field).is_some(), "missing {field}");
        }
        let rating = product["rating"].as_i64().unwrap();
        assert!((1..=5).contains(&rating));
    }

    #[test]
    fn test_review_sentence() {
        let mut rng = StdRng::seed_from_u64(7);
        let comment = review(&mut rng)["comment"].as_str().unwrap().to_string();
        assert!(comment.ends_with('.'));
        assert!(comment.chars().next().unwrap().is_ascii_uppercase());
    }
}

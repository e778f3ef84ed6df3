use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::catalog::{fill_pattern, CategoryTemplate, TopicCatalog};
use crate::history::UsageHistory;
use crate::models::ArticleIdea;

/// Attempts at drawing a novel catalog idea before falling back to the generic pool
pub const MAX_ATTEMPTS: usize = 50;
/// Published count at which a category starts being throttled
pub const BALANCE_THRESHOLD: u32 = 3;
/// Chance a throttled category is still accepted when drawn
pub const THROTTLED_ACCEPT_RATE: f64 = 0.3;

pub const FALLBACK_CATEGORY: &str = "Cat Care Basics";

struct FallbackIdea {
    title: &'static str,
    outline: &'static [&'static str],
}

const FALLBACK_POOL: &[FallbackIdea] = &[
    FallbackIdea {
        title: "Everyday Cat Care: A Practical Checklist for Owners",
        outline: &[
            "Daily Routine",
            "Food and Water",
            "Litter Box Hygiene",
            "Grooming",
            "Play and Enrichment",
            "When to See a Vet",
        ],
    },
    FallbackIdea {
        title: "Understanding Your Cat: A Guide to Body Language",
        outline: &[
            "Tail Signals",
            "Ears and Eyes",
            "Vocalizations",
            "Posture",
            "Reading the Whole Picture",
        ],
    },
    FallbackIdea {
        title: "Creating a Cat-Friendly Home",
        outline: &[
            "Safe Spaces",
            "Vertical Territory",
            "Hazards to Remove",
            "Scratching Outlets",
            "Multi-Cat Households",
        ],
    },
];

/// Picks one novel, category-balanced article idea per call
pub struct IdeaSelector<'a> {
    catalog: &'a TopicCatalog,
}

impl<'a> IdeaSelector<'a> {
    pub fn new(catalog: &'a TopicCatalog) -> Self {
        Self { catalog }
    }

    /// Draw an idea whose topic key and title are absent from `history`.
    ///
    /// Never fails: if the catalog yields nothing novel within [`MAX_ATTEMPTS`]
    /// draws, a generic idea with a freshly minted key is returned instead.
    /// Does not modify `history`; the caller records the idea once it is used.
    pub fn select<R: Rng + ?Sized>(&self, history: &UsageHistory, rng: &mut R) -> ArticleIdea {
        for attempt in 1..=MAX_ATTEMPTS {
            let Some(category) = self.catalog.categories().choose(rng) else {
                break;
            };

            let count = history.category_count(&category.name);
            if count >= BALANCE_THRESHOLD && !rng.gen_bool(THROTTLED_ACCEPT_RATE) {
                debug!(attempt, category = %category.name, count, "category throttled");
                continue;
            }

            let candidate = draft(category, rng);
            if history.has_key(&candidate.topic_key) || history.has_title(&candidate.title) {
                debug!(attempt, key = %candidate.topic_key, "topic already used");
                continue;
            }

            debug!(attempt, key = %candidate.topic_key, "selected idea");
            return candidate;
        }

        info!(
            attempts = MAX_ATTEMPTS,
            "no novel catalog topic found, using generic fallback"
        );
        fallback(history, rng)
    }
}

fn draft<R: Rng + ?Sized>(category: &CategoryTemplate, rng: &mut R) -> ArticleIdea {
    let picks: Vec<(&str, &str)> = category
        .axes
        .iter()
        .map(|axis| {
            let value = axis.values.choose(rng).map(String::as_str).unwrap_or_default();
            (axis.name.as_str(), value)
        })
        .collect();

    let pattern = category
        .title_patterns
        .choose(rng)
        .map(String::as_str)
        .unwrap_or(category.name.as_str());

    ArticleIdea {
        title: fill_pattern(pattern, &picks),
        category: category.name.clone(),
        outline: category.outline.clone(),
        topic_key: topic_key(category, &picks),
    }
}

/// Category name followed by the keyed axis values, in declaration order.
/// The title pattern is not part of the key.
pub fn topic_key(category: &CategoryTemplate, picks: &[(&str, &str)]) -> String {
    let mut parts = vec![category.name.as_str()];
    for (axis, (_, value)) in category.axes.iter().zip(picks) {
        if axis.keyed {
            parts.push(value);
        }
    }
    parts.join("_")
}

/// Random suffixes tried before scanning for the lowest free one
const FALLBACK_KEY_DRAWS: usize = 100;

/// `<FALLBACK_CATEGORY>_<suffix>` not yet in `history`. Random 6-digit suffixes
/// come first; after `draws` collisions the lowest unused suffix is taken.
fn fallback_key<R: Rng + ?Sized>(history: &UsageHistory, rng: &mut R, draws: usize) -> String {
    let key_for = |suffix: u64| format!("{}_{}", FALLBACK_CATEGORY, suffix);

    for _ in 0..draws {
        let key = key_for(rng.gen_range(100_000..1_000_000));
        if !history.has_key(&key) {
            return key;
        }
    }

    // The history is finite, so some suffix is always free
    (100_000u64..)
        .map(key_for)
        .find(|key| !history.has_key(key))
        .unwrap_or_else(|| key_for(u64::MAX))
}

fn fallback<R: Rng + ?Sized>(history: &UsageHistory, rng: &mut R) -> ArticleIdea {
    let unused: Vec<&FallbackIdea> = FALLBACK_POOL
        .iter()
        .filter(|idea| !history.has_title(idea.title))
        .collect();

    let (base, title) = match unused.choose(rng) {
        Some(idea) => (*idea, idea.title.to_string()),
        None => {
            let idea = &FALLBACK_POOL[rng.gen_range(0..FALLBACK_POOL.len())];
            let title = (2..)
                .map(|part| format!("{} (Part {})", idea.title, part))
                .find(|title| !history.has_title(title))
                .unwrap_or_else(|| idea.title.to_string());
            (idea, title)
        }
    };

    let topic_key = fallback_key(history, rng, FALLBACK_KEY_DRAWS);

    ArticleIdea {
        title,
        category: FALLBACK_CATEGORY.to_string(),
        outline: base.outline.iter().map(|s| s.to_string()).collect(),
        topic_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Axis;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn two_breed_catalog() -> TopicCatalog {
        TopicCatalog::new(vec![CategoryTemplate::new("Breeds", "breed", "🏆")
            .patterns(&["All about the {breed}"])
            .axis(Axis::keyed("breed", &["Ragdoll", "Persian"]))
            .outline(&["History", "Care"])])
        .unwrap()
    }

    fn wide_category(name: &str) -> CategoryTemplate {
        let values: Vec<String> = (0..5000).map(|i| format!("{}-{}", name, i)).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        CategoryTemplate::new(name, name, "🐾")
            .patterns(&["Notes on {subject}"])
            .axis(Axis::keyed("subject", &refs))
            .outline(&["Intro"])
    }

    #[test]
    fn empty_history_yields_catalog_idea() {
        let catalog = TopicCatalog::builtin();
        let selector = IdeaSelector::new(&catalog);
        let history = UsageHistory::default();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let idea = selector.select(&history, &mut rng);
            let category = catalog.get(&idea.category).expect("category from catalog");
            assert!(!idea.title.is_empty());
            assert!(!idea.title.contains('{'), "unfilled placeholder in {}", idea.title);
            assert_eq!(idea.outline, category.outline);
            assert!(idea.topic_key.starts_with(&category.name));
        }
    }

    #[test]
    fn select_does_not_touch_history() {
        let catalog = TopicCatalog::builtin();
        let history = UsageHistory::default();
        let mut rng = StdRng::seed_from_u64(7);
        IdeaSelector::new(&catalog).select(&history, &mut rng);
        assert!(history.is_empty());
    }

    #[test]
    fn select_and_record_never_repeats_key_or_title() {
        let catalog = TopicCatalog::builtin();
        let selector = IdeaSelector::new(&catalog);
        let mut history = UsageHistory::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mut keys = HashSet::new();
        let mut titles = HashSet::new();
        for _ in 0..300 {
            let idea = selector.select(&history, &mut rng);
            assert!(keys.insert(idea.topic_key.clone()), "repeated key {}", idea.topic_key);
            assert!(titles.insert(idea.title.clone()), "repeated title {}", idea.title);
            history.record(&idea);
        }
    }

    #[test]
    fn exhausted_catalog_falls_back_to_fresh_key() {
        let catalog = two_breed_catalog();
        let selector = IdeaSelector::new(&catalog);
        let mut history = UsageHistory::default();
        let mut rng = StdRng::seed_from_u64(3);

        let first = selector.select(&history, &mut rng);
        history.record(&first);
        let second = selector.select(&history, &mut rng);
        history.record(&second);
        assert_eq!(history.topic_keys.len(), 2);
        assert!(history.has_key("Breeds_Ragdoll"));
        assert!(history.has_key("Breeds_Persian"));

        let mut keys = HashSet::new();
        let mut titles = HashSet::new();
        for _ in 0..10 {
            let idea = selector.select(&history, &mut rng);
            assert_eq!(idea.category, FALLBACK_CATEGORY);
            assert!(!history.has_key(&idea.topic_key));
            assert!(!history.has_title(&idea.title));
            assert!(keys.insert(idea.topic_key.clone()));
            assert!(titles.insert(idea.title.clone()));
            history.record(&idea);
        }
    }

    #[test]
    fn key_ignores_title_pattern() {
        let catalog = TopicCatalog::new(vec![CategoryTemplate::new("Breeds", "breed", "🏆")
            .patterns(&["All about the {breed}", "Meet the {breed}"])
            .axis(Axis::keyed("breed", &["Ragdoll"]))
            .outline(&["History"])])
        .unwrap();
        let selector = IdeaSelector::new(&catalog);

        let mut seen_titles = HashSet::new();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let idea = selector.select(&UsageHistory::default(), &mut rng);
            assert_eq!(idea.topic_key, "Breeds_Ragdoll");
            seen_titles.insert(idea.title);
        }
        assert_eq!(seen_titles.len(), 2);

        let mut history = UsageHistory::default();
        let mut rng = StdRng::seed_from_u64(1);
        let first = selector.select(&history, &mut rng);
        history.record(&first);
        let next = selector.select(&history, &mut rng);
        assert_eq!(next.category, FALLBACK_CATEGORY);
    }

    #[test]
    fn cosmetic_axis_is_left_out_of_key() {
        let catalog = TopicCatalog::builtin();
        let reviews = catalog.get("Product Reviews").unwrap();
        let key = topic_key(reviews, &[("product", "Cat Litter"), ("count", "8")]);
        assert_eq!(key, "Product Reviews_Cat Litter");

        let kittens = catalog.get("Kitten Care").unwrap();
        let key = topic_key(kittens, &[("age", "2-4 Week Old"), ("topic", "Feeding")]);
        assert_eq!(key, "Kitten Care_2-4 Week Old_Feeding");
    }

    #[test]
    fn busy_category_is_throttled_but_not_excluded() {
        let catalog = TopicCatalog::new(vec![wide_category("busy"), wide_category("quiet")]).unwrap();
        let selector = IdeaSelector::new(&catalog);
        let mut history = UsageHistory::default();
        history.category_counts.insert("busy".to_string(), BALANCE_THRESHOLD);
        let mut rng = StdRng::seed_from_u64(2024);

        let trials = 4000;
        let busy = (0..trials)
            .filter(|_| selector.select(&history, &mut rng).category == "busy")
            .count();
        let share = busy as f64 / trials as f64;

        // per draw: 0.5 * 0.3 accepted vs 0.5 for the quiet category, so ~0.23
        assert!(busy > 0);
        assert!(share > 0.17 && share < 0.30, "busy share was {}", share);
    }

    #[test]
    fn category_below_threshold_is_not_throttled() {
        let catalog = TopicCatalog::new(vec![wide_category("busy"), wide_category("quiet")]).unwrap();
        let selector = IdeaSelector::new(&catalog);
        let mut history = UsageHistory::default();
        history.category_counts.insert("busy".to_string(), BALANCE_THRESHOLD - 1);
        let mut rng = StdRng::seed_from_u64(99);

        let trials = 4000;
        let busy = (0..trials)
            .filter(|_| selector.select(&history, &mut rng).category == "busy")
            .count();
        let share = busy as f64 / trials as f64;
        assert!(share > 0.45 && share < 0.55, "busy share was {}", share);
    }

    #[test]
    fn sole_throttled_category_is_still_selected() {
        let catalog = TopicCatalog::new(vec![wide_category("only")]).unwrap();
        let selector = IdeaSelector::new(&catalog);
        let mut history = UsageHistory::default();
        history.category_counts.insert("only".to_string(), 10);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            assert_eq!(selector.select(&history, &mut rng).category, "only");
        }
    }

    #[test]
    fn fallback_key_scans_for_free_suffix_after_draws() {
        let mut history = UsageHistory::default();
        for suffix in 100_000..100_005 {
            history
                .topic_keys
                .insert(format!("{}_{}", FALLBACK_CATEGORY, suffix));
        }
        let mut rng = StdRng::seed_from_u64(0);

        let key = fallback_key(&history, &mut rng, 0);
        assert_eq!(key, format!("{}_100005", FALLBACK_CATEGORY));
    }

    #[test]
    fn fallback_key_prefers_random_suffix() {
        let history = UsageHistory::default();
        let mut rng = StdRng::seed_from_u64(12);

        let key = fallback_key(&history, &mut rng, FALLBACK_KEY_DRAWS);
        let suffix: u64 = key
            .strip_prefix(&format!("{}_", FALLBACK_CATEGORY))
            .unwrap()
            .parse()
            .unwrap();
        assert!((100_000..1_000_000).contains(&suffix));
    }
}

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// A named vocabulary that fills one `{placeholder}` in a title pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<String>,
    /// Whether the sampled value is part of the topic key
    pub keyed: bool,
}

impl Axis {
    pub fn keyed(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
            keyed: true,
        }
    }

    /// An axis that only changes phrasing, e.g. how many products a review compares
    pub fn cosmetic(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            keyed: false,
            ..Self::keyed(name, values)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTemplate {
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub title_patterns: Vec<String>,
    pub axes: Vec<Axis>,
    pub outline: Vec<String>,
}

impl CategoryTemplate {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            icon: icon.into(),
            title_patterns: Vec::new(),
            axes: Vec::new(),
            outline: Vec::new(),
        }
    }

    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.title_patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn outline(mut self, sections: &[&str]) -> Self {
        self.outline = sections.iter().map(|s| s.to_string()).collect();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.title_patterns.is_empty() {
            anyhow::bail!("Category '{}' has no title patterns", self.name);
        }
        if self.outline.is_empty() {
            anyhow::bail!("Category '{}' has an empty outline", self.name);
        }
        if !self.axes.iter().any(|a| a.keyed) {
            anyhow::bail!("Category '{}' needs at least one keyed axis", self.name);
        }
        for axis in &self.axes {
            if axis.values.is_empty() {
                anyhow::bail!(
                    "Axis '{}' in category '{}' has no values",
                    axis.name,
                    self.name
                );
            }
        }
        for pattern in &self.title_patterns {
            for cap in RE_PLACEHOLDER.captures_iter(pattern) {
                let name = &cap[1];
                if !self.axes.iter().any(|a| a.name == name) {
                    anyhow::bail!(
                        "Pattern '{}' in category '{}' uses undeclared placeholder {{{}}}",
                        pattern,
                        self.name,
                        name
                    );
                }
            }
        }
        Ok(())
    }
}

/// Substitute `{name}` placeholders with the sampled values. Unknown names are left as-is.
pub fn fill_pattern(pattern: &str, values: &[(&str, &str)]) -> String {
    RE_PLACEHOLDER
        .replace_all(pattern, |caps: &regex::Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(axis, _)| *axis == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct TopicCatalog {
    categories: Vec<CategoryTemplate>,
}

impl TopicCatalog {
    pub fn new(categories: Vec<CategoryTemplate>) -> Result<Self> {
        if categories.is_empty() {
            anyhow::bail!("Topic catalog must contain at least one category");
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.name.as_str()) {
                anyhow::bail!("Duplicate category name: {}", category.name);
            }
            category.validate()?;
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[CategoryTemplate] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&CategoryTemplate> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn slug_for(&self, category: &str) -> &str {
        self.get(category).map(|c| c.slug.as_str()).unwrap_or("article")
    }

    pub fn icon_for(&self, category: &str) -> &str {
        self.get(category).map(|c| c.icon.as_str()).unwrap_or("🐱")
    }

    /// The site's built-in editorial catalog
    pub fn builtin() -> Self {
        let categories = vec![
            CategoryTemplate::new("Breed Profiles", "breed", "🏆")
                .patterns(&[
                    "{breed} Breed Guide: Temperament and Care Essentials",
                    "A Deep Dive into the {breed}: From History to Modern Care",
                    "The Complete {breed} Guide: Choosing, Grooming and Training",
                    "Meet the {breed}: Breed Traits and Care Tips",
                ])
                .axis(Axis::keyed(
                    "breed",
                    &[
                        "British Shorthair",
                        "American Shorthair",
                        "Ragdoll",
                        "Persian",
                        "Siamese",
                        "Maine Coon",
                        "Russian Blue",
                        "Scottish Fold",
                        "Norwegian Forest Cat",
                        "Turkish Angora",
                    ],
                ))
                .outline(&[
                    "Origin and History",
                    "Physical Characteristics",
                    "Temperament",
                    "Living Environment",
                    "Daily Care",
                    "Health Considerations",
                    "Who It Suits Best",
                ]),
            CategoryTemplate::new("Kitten Care", "kitten-care", "🍼")
                .patterns(&[
                    "The Complete Guide to Caring for {age} Kittens",
                    "Expert Advice on {topic} for Newborn Kittens",
                    "{topic} for {age} Kittens: Methods and Precautions",
                    "Kitten {topic}: Common Questions Answered",
                ])
                .axis(Axis::keyed(
                    "age",
                    &[
                        "2-4 Week Old",
                        "1-2 Month Old",
                        "2-3 Month Old",
                        "3-6 Month Old",
                        "6-12 Month Old",
                    ],
                ))
                .axis(Axis::keyed(
                    "topic",
                    &[
                        "Feeding",
                        "Vaccination",
                        "Socialization",
                        "Health Checks",
                        "Settling In",
                    ],
                ))
                .outline(&[
                    "Developmental Stage",
                    "Nutritional Needs",
                    "Feeding Schedule",
                    "Setting Up the Environment",
                    "Health Indicators to Watch",
                    "Handling Common Problems",
                    "Growth Milestones",
                ]),
            CategoryTemplate::new("Product Reviews", "product-review", "🥫")
                .patterns(&[
                    "{product} Reviewed: {count} Products Compared",
                    "{product} Buying Guide: Value Analysis and Picks",
                    "Expert Review: {product} Brands Head to Head",
                    "{product} in Practice: Real Owner Feedback",
                ])
                .axis(Axis::keyed(
                    "product",
                    &[
                        "Cat Food",
                        "Cat Litter",
                        "Cat Toys",
                        "Cat Beds",
                        "Scratching Posts",
                        "Automatic Feeders",
                        "Water Fountains",
                        "Cat Carriers",
                        "Cat Trees",
                    ],
                ))
                .axis(Axis::cosmetic("count", &["5", "8", "10", "12"]))
                .outline(&[
                    "Product Types",
                    "How We Tested",
                    "Brand Comparison",
                    "Test Results",
                    "User Experience",
                    "Value for Money",
                    "Buying Recommendations",
                ]),
            CategoryTemplate::new("Health Care", "health-care", "🏥")
                .patterns(&[
                    "Preventing and Treating {condition} in Cats",
                    "How {condition} Shows Up in Cats and What to Do",
                    "Expert Guide: Complete Care for Cats with {condition}",
                    "{condition} in Cats: Recognizing Symptoms and Responding",
                ])
                .axis(Axis::keyed(
                    "condition",
                    &[
                        "Stomatitis",
                        "Skin Disease",
                        "Urinary Tract Disease",
                        "Indigestion",
                        "Respiratory Infections",
                        "Parasites",
                        "Obesity",
                        "Arthritis",
                        "Heart Disease",
                    ],
                ))
                .outline(&[
                    "Overview",
                    "Recognizing the Symptoms",
                    "Causes",
                    "Prevention",
                    "Treatment Options",
                    "Home Care",
                    "Recovery",
                ]),
            CategoryTemplate::new("Behavior Training", "behavior-training", "🧠")
                .patterns(&[
                    "Effective Ways to Solve Cat {behavior}",
                    "Training Away {behavior}: From Basics to Advanced",
                    "Understanding and Correcting {behavior} in Cats",
                    "A Professional Trainer on Handling Cat {behavior}",
                ])
                .axis(Axis::keyed(
                    "behavior",
                    &[
                        "Litter Box Avoidance",
                        "Furniture Scratching",
                        "Biting",
                        "Night-Time Yowling",
                        "Picky Eating",
                        "Aggression",
                        "Separation Anxiety",
                        "Overgrooming",
                    ],
                ))
                .outline(&[
                    "Why the Behavior Happens",
                    "Normal vs. Problem Behavior",
                    "Training Principles",
                    "Step-by-Step Training",
                    "Tools and Environment",
                    "Mistakes to Avoid",
                    "Tracking Progress",
                ]),
        ];

        Self { categories }
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

//! Selector rules for the three page kinds, kept as data.
//!
//! The built-in set matches the site's current markup. A `[selectors]` table in the config
//! file overrides individual rules; anything not given keeps its built-in value.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::scraper::error::ScraperError;

/// Version tag of the built-in rules. Bump when the site markup changes.
pub const BUILTIN_VERSION: &str = "mgeko-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub version: String,
    pub search: SearchRules,
    pub chapters: ChapterRules,
    pub images: ImageRules,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            version: BUILTIN_VERSION.to_string(),
            search: SearchRules::default(),
            chapters: ChapterRules::default(),
            images: ImageRules::default(),
        }
    }
}

/// Search results page: one `item` per title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRules {
    pub item: String,
    pub title: String,
    pub link: String,
    pub link_attr: String,
    pub author: String,
    pub summary: String,
    pub summary_attr: String,
}

impl Default for SearchRules {
    fn default() -> Self {
        Self {
            item: ".novel-item".to_string(),
            title: ".novel-title".to_string(),
            link: "a".to_string(),
            link_attr: "href".to_string(),
            author: ".text1row".to_string(),
            summary: ".summary".to_string(),
            summary_attr: "title".to_string(),
        }
    }
}

/// Title page: one `item` per chapter. `number_attr` and `order_attr` are read off the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterRules {
    pub item: String,
    pub number_attr: String,
    pub order_attr: String,
    pub link: String,
    pub link_attr: String,
    pub title: String,
    pub read_time: String,
}

impl Default for ChapterRules {
    fn default() -> Self {
        Self {
            item: "ul.chapter-list > li.chapter-list-item".to_string(),
            number_attr: "data-chapterno".to_string(),
            order_attr: "data-orderno".to_string(),
            link: "a".to_string(),
            link_attr: "href".to_string(),
            title: ".chapter-number".to_string(),
            read_time: ".chapter-stats".to_string(),
        }
    }
}

/// Chapter reader page: every `image` match is one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRules {
    pub image: String,
    pub src_attr: String,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            image: "#chapter-reader img".to_string(),
            src_attr: "src".to_string(),
        }
    }
}

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(rule: &str) -> Result<Selector, ScraperError> {
    Selector::parse(rule).map_err(|e| ScraperError::Parse {
        rule: rule.to_string(),
        message: e.to_string(),
    })
}

/// [SelectorSet] with every rule compiled.
#[derive(Debug)]
pub struct CompiledSelectors {
    pub version: String,
    pub search: CompiledSearch,
    pub chapters: CompiledChapters,
    pub images: CompiledImages,
}

#[derive(Debug)]
pub struct CompiledSearch {
    pub item: Selector,
    pub title: Selector,
    pub link: Selector,
    pub link_attr: String,
    pub author: Selector,
    pub summary: Selector,
    pub summary_attr: String,
}

#[derive(Debug)]
pub struct CompiledChapters {
    pub item: Selector,
    pub number_attr: String,
    pub order_attr: String,
    pub link: Selector,
    pub link_attr: String,
    pub title: Selector,
    pub read_time: Selector,
}

#[derive(Debug)]
pub struct CompiledImages {
    pub image: Selector,
    pub src_attr: String,
}

impl SelectorSet {
    pub fn compile(&self) -> Result<CompiledSelectors, ScraperError> {
        let s = &self.search;
        let c = &self.chapters;
        let i = &self.images;
        Ok(CompiledSelectors {
            version: self.version.clone(),
            search: CompiledSearch {
                item: parse_selector(&s.item)?,
                title: parse_selector(&s.title)?,
                link: parse_selector(&s.link)?,
                link_attr: s.link_attr.clone(),
                author: parse_selector(&s.author)?,
                summary: parse_selector(&s.summary)?,
                summary_attr: s.summary_attr.clone(),
            },
            chapters: CompiledChapters {
                item: parse_selector(&c.item)?,
                number_attr: c.number_attr.clone(),
                order_attr: c.order_attr.clone(),
                link: parse_selector(&c.link)?,
                link_attr: c.link_attr.clone(),
                title: parse_selector(&c.title)?,
                read_time: parse_selector(&c.read_time)?,
            },
            images: CompiledImages {
                image: parse_selector(&i.image)?,
                src_attr: i.src_attr.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_compile() -> Result<(), ScraperError> {
        let compiled = SelectorSet::default().compile()?;
        assert_eq!(compiled.version, BUILTIN_VERSION);
        assert_eq!(compiled.chapters.order_attr, "data-orderno");
        assert_eq!(compiled.images.src_attr, "src");
        Ok(())
    }

    #[test]
    fn partial_override_keeps_other_rules() -> Result<(), toml::de::Error> {
        let set: SelectorSet = toml::from_str(
            r#"
            version = "mgeko-2"
            [images]
            image = "div.page-break img"
            "#,
        )?;
        assert_eq!(set.version, "mgeko-2");
        assert_eq!(set.images.image, "div.page-break img");
        assert_eq!(set.images.src_attr, "src");
        assert_eq!(set.search, SearchRules::default());
        assert_eq!(set.chapters, ChapterRules::default());
        Ok(())
    }

    #[test]
    fn invalid_rule_is_parse_error() -> Result<(), String> {
        let mut set = SelectorSet::default();
        set.search.title = "div[".to_string();
        match set.compile() {
            Err(ScraperError::Parse { rule, .. }) if rule == "div[" => Ok(()),
            other => Err(format!("expected Parse error, got {:?}", other.map(|_| ()))),
        }
    }
}

//! Static prompt tables, embedded at compile time.
//!
//! Each collection is a JSON list of `{category, prompts[]}` groups. The
//! category is stamped onto every descriptor while loading, so callers only
//! ever see a flat, ordered list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_DURATION_SECS: u32 = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptDescriptor {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub category: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub purpose: String,
}

impl PromptDescriptor {
    pub fn aspect_ratio(&self) -> &str {
        self.aspect_ratio.as_deref().unwrap_or(DEFAULT_ASPECT_RATIO)
    }

    pub fn duration(&self) -> u32 {
        self.duration.unwrap_or(DEFAULT_DURATION_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct PromptGroup {
    category: String,
    prompts: Vec<PromptDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    SiteImages,
    SiteVideos,
    HeroVideos,
    MediaImages,
    NewsImages,
    BackfillImages,
    BackfillVideos,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::SiteImages,
        Collection::SiteVideos,
        Collection::HeroVideos,
        Collection::MediaImages,
        Collection::NewsImages,
        Collection::BackfillImages,
        Collection::BackfillVideos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::SiteImages => "site-images",
            Collection::SiteVideos => "site-videos",
            Collection::HeroVideos => "hero-videos",
            Collection::MediaImages => "media-images",
            Collection::NewsImages => "news-images",
            Collection::BackfillImages => "backfill-images",
            Collection::BackfillVideos => "backfill-videos",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Collection::SiteImages => include_str!("../data/site_images.json"),
            Collection::SiteVideos => include_str!("../data/site_videos.json"),
            Collection::HeroVideos => include_str!("../data/hero_videos.json"),
            Collection::MediaImages => include_str!("../data/media_images.json"),
            Collection::NewsImages => include_str!("../data/news_images.json"),
            Collection::BackfillImages => include_str!("../data/backfill_images.json"),
            Collection::BackfillVideos => include_str!("../data/backfill_videos.json"),
        }
    }
}

pub fn load(collection: Collection) -> Result<Vec<PromptDescriptor>> {
    let groups: Vec<PromptGroup> = serde_json::from_str(collection.source())
        .with_context(|| format!("Failed to parse prompt catalog {}", collection.name()))?;

    Ok(groups
        .into_iter()
        .flat_map(|group| {
            let category = group.category;
            group.prompts.into_iter().map(move |mut p| {
                p.category = category.clone();
                p
            })
        })
        .collect())
}

/// Distinct categories in first-seen order.
pub fn categories(prompts: &[PromptDescriptor]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for p in prompts {
        if !out.iter().any(|c| c == &p.category) {
            out.push(p.category.clone());
        }
    }
    out
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SelectionError {
    #[error("No prompt found with id '{0}'")]
    UnknownId(String),

    #[error("No prompts found for category '{category}' (available: {})", .available.join(", "))]
    UnknownCategory {
        category: String,
        available: Vec<String>,
    },
}

/// An id filter wins over a category filter; neither selects everything.
pub fn select(
    prompts: &[PromptDescriptor],
    id: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<PromptDescriptor>, SelectionError> {
    if let Some(id) = id {
        let found: Vec<_> = prompts.iter().filter(|p| p.id == id).cloned().collect();
        if found.is_empty() {
            return Err(SelectionError::UnknownId(id.to_string()));
        }
        return Ok(found);
    }

    if let Some(category) = category {
        let found: Vec<_> = prompts
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(SelectionError::UnknownCategory {
                category: category.to_string(),
                available: categories(prompts),
            });
        }
        return Ok(found);
    }

    Ok(prompts.to_vec())
}

/// Stable reorder: categories named in `priority` first, in that order, then the rest.
pub fn order_by_category(prompts: &[PromptDescriptor], priority: &[&str]) -> Vec<PromptDescriptor> {
    let rank = |p: &PromptDescriptor| {
        priority
            .iter()
            .position(|c| *c == p.category)
            .unwrap_or(priority.len())
    };
    let mut out = prompts.to_vec();
    out.sort_by_key(rank);
    out
}

pub fn count_by_category(prompts: &[PromptDescriptor]) -> Vec<(String, usize)> {
    categories(prompts)
        .into_iter()
        .map(|c| {
            let n = prompts.iter().filter(|p| p.category == c).count();
            (c, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_collection_parses_with_unique_ids() {
        for collection in Collection::ALL {
            let prompts = load(collection).unwrap();
            assert!(!prompts.is_empty(), "{} is empty", collection.name());
            let ids: HashSet<_> = prompts.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids.len(), prompts.len(), "duplicate id in {}", collection.name());
            for p in &prompts {
                assert!(!p.category.is_empty());
                assert!(!p.filename.is_empty());
                assert!(!p.prompt.is_empty());
            }
        }
    }

    #[test]
    fn site_images_keep_category_order() {
        let prompts = load(Collection::SiteImages).unwrap();
        assert_eq!(
            categories(&prompts),
            vec![
                "hero",
                "divisions",
                "sectors",
                "about",
                "sustainability",
                "careers",
                "partners",
                "ui-elements"
            ]
        );
        assert_eq!(prompts.len(), 35);
        assert_eq!(prompts[0].id, "hero_main_01");
    }

    #[test]
    fn site_videos_default_to_eight_seconds_in_sixteen_nine() {
        let prompts = load(Collection::SiteVideos).unwrap();
        assert_eq!(prompts.len(), 7);
        assert!(prompts.iter().all(|p| p.duration() == 8));
        assert!(prompts.iter().all(|p| p.aspect_ratio() == "16:9"));
    }

    #[test]
    fn selection_by_id_beats_category() {
        let prompts = load(Collection::SiteVideos).unwrap();
        let picked = select(&prompts, Some("video_div_green"), Some("hero")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].category, "divisions");
    }

    #[test]
    fn unknown_category_lists_available() {
        let prompts = load(Collection::SiteVideos).unwrap();
        let err = select(&prompts, None, Some("lobby")).unwrap_err();
        match err {
            SelectionError::UnknownCategory { available, .. } => {
                assert_eq!(available, vec!["hero", "about", "divisions", "careers"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            select(&prompts, Some("nope"), None).unwrap_err(),
            SelectionError::UnknownId("nope".into())
        );
    }

    #[test]
    fn priority_order_is_stable() {
        let prompts = load(Collection::SiteVideos).unwrap();
        let ordered = order_by_category(&prompts, &["careers", "hero"]);
        let cats: Vec<_> = ordered.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(
            cats,
            vec!["careers", "hero", "hero", "hero", "about", "divisions", "divisions"]
        );
        assert_eq!(ordered[1].id, "video_hero_main");
    }
}

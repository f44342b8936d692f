use crate::error::LabError;
use crate::model::LabImage;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoadOutcome {
    Replaced { images: usize, dropped_duplicates: usize },
    RetainedPrevious { images: usize },
}

/// The lab images of the latest successful load. Replaced wholesale, never
/// edited in place.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    images: Vec<LabImage>,
    last_loaded: Option<DateTime<Local>>,
    last_error: Option<String>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn last_loaded(&self) -> Option<DateTime<Local>> {
        self.last_loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, image_id: &str) -> Option<&LabImage> {
        self.images.iter().find(|image| image.id == image_id)
    }

    pub fn filter(&self, query: &str) -> Vec<&LabImage> {
        filter_images(&self.images, query)
    }

    /// Applies the result of one load. A failed load leaves the previously
    /// loaded images in place.
    pub fn apply_load(
        &mut self,
        result: Result<Vec<LabImage>, LabError>,
        loaded_at: DateTime<Local>,
    ) -> LoadOutcome {
        match result {
            Ok(images) => {
                let dropped_duplicates = self.replace(images, loaded_at);
                LoadOutcome::Replaced {
                    images: self.images.len(),
                    dropped_duplicates,
                }
            }
            Err(error) => {
                self.last_error = Some(error.to_string());
                LoadOutcome::RetainedPrevious {
                    images: self.images.len(),
                }
            }
        }
    }

    fn replace(&mut self, images: Vec<LabImage>, loaded_at: DateTime<Local>) -> usize {
        let total = images.len();
        let mut seen = HashSet::with_capacity(total);
        self.images = images
            .into_iter()
            .filter(|image| {
                let first = seen.insert(image.id.clone());
                if !first {
                    warn!("ignoring duplicate lab image id {}", image.id);
                }
                first
            })
            .collect();
        self.last_loaded = Some(loaded_at);
        self.last_error = None;
        total - self.images.len()
    }
}

pub fn filter_images<'a>(images: &'a [LabImage], query: &str) -> Vec<&'a LabImage> {
    images
        .iter()
        .filter(|image| image.matches_subject(query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Catalog, LoadOutcome, filter_images};
    use crate::error::LabError;
    use crate::model::LabImage;
    use chrono::Local;

    fn image(id: &str, subject: Option<&str>) -> LabImage {
        LabImage {
            id: id.to_string(),
            subject: subject.map(str::to_string),
            ..LabImage::default()
        }
    }

    fn sample() -> Vec<LabImage> {
        vec![
            image("a", Some("OS Labs")),
            image("b", Some("Database Systems")),
            image("c", None),
            image("d", Some("Advanced OS")),
        ]
    }

    #[test]
    fn empty_query_returns_whole_catalog_in_order() {
        let images = sample();
        let ids = filter_images(&images, "")
            .into_iter()
            .map(|image| image.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn filter_keeps_order_and_matches_case_insensitively() {
        let images = sample();
        let ids = filter_images(&images, "Os")
            .into_iter()
            .map(|image| image.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn missing_subject_never_matches_non_empty_query() {
        let images = sample();
        assert!(
            filter_images(&images, "a")
                .iter()
                .all(|image| image.id != "c")
        );
    }

    #[test]
    fn single_entry_scenario() {
        let images = vec![LabImage {
            id: "a".to_string(),
            subject: Some("OS Labs".to_string()),
            ubuntu_pull_command: Some("docker pull os:u".to_string()),
            windows_pull_command: Some("docker pull os:w".to_string()),
            ..LabImage::default()
        }];
        assert_eq!(filter_images(&images, "os").len(), 1);
        assert!(filter_images(&images, "db").is_empty());
    }

    #[test]
    fn failed_load_retains_previous_catalog() {
        let mut catalog = Catalog::default();
        let outcome = catalog.apply_load(Ok(sample()), Local::now());
        assert_eq!(
            outcome,
            LoadOutcome::Replaced {
                images: 4,
                dropped_duplicates: 0
            }
        );
        let loaded_at = catalog.last_loaded();

        let outcome = catalog.apply_load(
            Err(LabError::CatalogLoad("connection refused".to_string())),
            Local::now(),
        );
        assert_eq!(outcome, LoadOutcome::RetainedPrevious { images: 4 });
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.filter("os").len(), 2);
        assert_eq!(catalog.last_loaded(), loaded_at);
        assert!(
            catalog
                .last_error()
                .is_some_and(|error| error.contains("connection refused"))
        );
    }

    #[test]
    fn failed_first_load_leaves_catalog_empty() {
        let mut catalog = Catalog::default();
        catalog.apply_load(Err(LabError::CatalogLoad("boom".to_string())), Local::now());
        assert!(catalog.is_empty());
        assert!(catalog.filter("").is_empty());
    }

    #[test]
    fn reload_replaces_catalog_wholesale() {
        let mut catalog = Catalog::default();
        catalog.apply_load(Ok(sample()), Local::now());
        catalog.apply_load(Ok(vec![image("z", Some("Networks"))]), Local::now());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.find("a").is_none());
        assert!(catalog.find("z").is_some());
        assert_eq!(catalog.last_error(), None);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let mut catalog = Catalog::default();
        let outcome = catalog.apply_load(
            Ok(vec![
                image("a", Some("first")),
                image("a", Some("second")),
                image("b", Some("other")),
            ]),
            Local::now(),
        );
        assert_eq!(
            outcome,
            LoadOutcome::Replaced {
                images: 2,
                dropped_duplicates: 1
            }
        );
        assert_eq!(catalog.find("a").map(LabImage::subject), Some("first"));
    }
}

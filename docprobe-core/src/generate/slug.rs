use std::collections::hash_map::Entry;

use heck::ToKebabCase;
use rustc_hash::FxHashMap;
use unicase::UniCase;

use crate::model::Endpoint;

/// Hands out endpoint slugs for test case IDs, like `post-orders` for
/// `POST /orders`.
///
/// Distinct paths can produce the same slug once they're kebab-cased,
/// like `/user_list` and `/user-list`. Later ones get a numeric suffix.
#[derive(Debug, Default)]
pub struct UniqueSlugs {
    space: FxHashMap<UniCase<String>, usize>,
}

impl UniqueSlugs {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(&mut self, endpoint: &Endpoint) -> String {
        let path = endpoint
            .path
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let path = match path.to_kebab_case() {
            path if path.is_empty() => "root".to_owned(),
            path => path,
        };
        self.uniquify(format!("{}-{path}", endpoint.method.as_str().to_lowercase()))
    }

    fn uniquify(&mut self, slug: String) -> String {
        match self.space.entry(UniCase::new(slug.clone())) {
            Entry::Occupied(mut entry) => {
                let count = entry.get_mut();
                *count += 1;
                format!("{slug}-{count}")
            }
            Entry::Vacant(entry) => {
                entry.insert(1);
                slug
            }
        }
    }
}

use std::collections::BTreeSet;

use crate::{Error, transformer::Transformer};

/// The related resources to include in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes(BTreeSet<String>);

impl Includes {
    /// Parse a comma separated `include` parameter for resources rendered by `T`.
    ///
    /// The transformer's default includes are always part of the result.
    ///
    /// # Errors
    /// Returns [Error::InvalidInclude] for the first name `T` does not offer.
    pub fn resolve<T: Transformer>(requested: Option<&str>) -> Result<Self, Error> {
        let mut names: BTreeSet<String> = T::DEFAULT_INCLUDES
            .iter()
            .map(|&name| name.to_owned())
            .collect();

        for name in requested
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            if !T::AVAILABLE_INCLUDES.contains(&name) {
                return Err(Error::InvalidInclude(name.to_owned()));
            }

            names.insert(name.to_owned());
        }

        Ok(Self(names))
    }

    /// Whether the relation `name` should be included.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use crate::{
        Error,
        transformer::{Includes, Transformer},
    };

    struct TestTransformer;

    impl Transformer for TestTransformer {
        type Entity = ();
        const RESOURCE_TYPE: &'static str = "tests";
        const AVAILABLE_INCLUDES: &'static [&'static str] = &["user", "transactions"];
        const DEFAULT_INCLUDES: &'static [&'static str] = &["user"];

        fn transform(&self, _: &()) -> Map<String, Value> {
            Map::new()
        }
    }

    #[test]
    fn defaults_are_always_included() {
        let includes = Includes::resolve::<TestTransformer>(None).unwrap();

        assert!(includes.contains("user"));
        assert!(!includes.contains("transactions"));
    }

    #[test]
    fn requested_names_are_trimmed() {
        let includes = Includes::resolve::<TestTransformer>(Some(" transactions ,,")).unwrap();

        assert!(includes.contains("transactions"));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let result = Includes::resolve::<TestTransformer>(Some("user,tags"));

        assert_eq!(result, Err(Error::InvalidInclude("tags".to_owned())));
    }
}

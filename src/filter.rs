use std::collections::HashSet;

/// Source-specific extraction of the `(name, email)` pair a filter judges.
pub trait Authored {
    fn author_name(&self) -> Option<&str>;
    fn author_email(&self) -> Option<&str>;
}

/// Name/email allow-list deciding which authors are kept.
///
/// An empty filter keeps everyone. Otherwise a candidate is kept when its
/// email is listed or its name is listed. Matching is exact: no case folding,
/// no whitespace trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFilter {
    emails: HashSet<String>,
    names: HashSet<String>,
}

impl DepartmentFilter {
    pub fn new<E, N>(emails: E, names: N) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.names.is_empty()
    }

    pub fn matches(&self, name: Option<&str>, email: Option<&str>) -> bool {
        if self.is_empty() {
            return true;
        }
        let email_hit = email.is_some_and(|e| self.emails.contains(e));
        let name_hit = name.is_some_and(|n| self.names.contains(n));
        email_hit || name_hit
    }
}

/// Repository slug allow-list. Empty means every repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFilter {
    slugs: HashSet<String>,
}

impl RepositoryFilter {
    pub fn new<I>(slugs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, slug: &str) -> bool {
        self.slugs.is_empty() || self.slugs.contains(slug)
    }
}

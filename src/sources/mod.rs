//! Source acquisition
//!
//! Listing the ebook repositories of a GitHub organization and cloning them.

pub mod git;
pub mod github;

pub use git::{clone_shallow, clone_url};
pub use github::{
    parse_link_header, read_repo_list, write_repo_list, GithubConfig, RepoLister, RepoSummary,
    DEFAULT_ORG,
};

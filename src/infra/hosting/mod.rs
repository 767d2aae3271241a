pub mod github_repo_host;

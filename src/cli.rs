use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// harborctl: Harbor registry API client with retention-policy cleanup
#[derive(Parser, Debug)]
#[command(name = "harborctl", version, about)]
pub struct Cli {
    /// Client configuration (scheme, dstip, insecure)
    #[arg(long, global = true, env = "HARBOR_CONFIG", default_value = "conf/config.yaml")]
    pub config: PathBuf,

    /// File holding the session saved by `login`
    #[arg(long, global = true, env = "HARBOR_SESSION_FILE", default_value = "conf/.cookie.yaml")]
    pub session_file: PathBuf,

    /// Retention policy used by rp_repos
    #[arg(long, global = true, env = "HARBOR_RP_POLICY", default_value = "rp.yaml")]
    pub policy: PathBuf,

    /// Harbor base URL (e.g. https://11.11.11.12), overrides scheme and dstip from the config
    #[arg(long, global = true, env = "HARBOR_URL")]
    pub url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank public repositories by retention policy and soft delete the lowest scored
    #[command(name = "rp_repos")]
    RpRepos,

    /// Delete the oldest excess tags of each repository by retention policy
    #[command(name = "rp_tags")]
    RpTags(RpTagsArgs),

    /// Print the loaded retention policy
    #[command(name = "rp_show")]
    RpShow,

    /// Log in to Harbor and save the session
    Login(LoginArgs),

    /// Log out from Harbor and forget the session
    Logout,

    /// Project and repository counts visible to the current user
    Statistics,

    /// Search for projects and repositories
    Search(SearchArgs),

    /// Most pulled public repositories
    #[command(name = "repos_top")]
    ReposTop(ReposTopArgs),

    /// Tags of a repository
    #[command(name = "tags_list")]
    TagsList(RepoNameArgs),

    /// Delete a repository
    #[command(name = "repo_del")]
    RepoDel(RepoNameArgs),

    /// Delete a tag of a repository
    #[command(name = "tag_del")]
    TagDel(TagDelArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RpTagsArgs {
    /// Tags created within the last N days are never deleted
    #[arg(short, long)]
    pub day: i64,

    /// Maximum number of tags older than N days kept per repository
    #[arg(short, long)]
    pub max: usize,

    /// Only process the repository with exactly this name (omit for all repositories)
    #[arg(short = 'n', long = "repo_name")]
    pub repo_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    /// Passing the password on the command line is insecure, prefer the environment
    #[arg(short, long, env = "HARBOR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Project or repository name to search for
    #[arg(short, long)]
    pub query: String,
}

#[derive(Args, Debug, Clone)]
pub struct ReposTopArgs {
    /// Number of repositories to return
    #[arg(short, long, default_value_t = 10)]
    pub count: u64,
}

#[derive(Args, Debug, Clone)]
pub struct RepoNameArgs {
    #[arg(short = 'n', long = "repo_name")]
    pub repo_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct TagDelArgs {
    #[arg(short = 'n', long = "repo_name")]
    pub repo_name: String,

    #[arg(short, long)]
    pub tag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rp_tags() {
        let cli = Cli::try_parse_from([
            "harborctl", "rp_tags", "--day", "10", "--max", "3", "--repo_name", "prj2/photon",
        ])
        .unwrap();
        match cli.command {
            Command::RpTags(args) => {
                assert_eq!(args.day, 10);
                assert_eq!(args.max, 3);
                assert_eq!(args.repo_name.as_deref(), Some("prj2/photon"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rp_tags_requires_day_and_max() {
        assert!(Cli::try_parse_from(["harborctl", "rp_tags", "--day", "10"]).is_err());
        assert!(Cli::try_parse_from(["harborctl", "rp_tags", "-m", "1"]).is_err());
    }

    #[test]
    fn test_parse_rp_repos_with_global_options() {
        let cli = Cli::try_parse_from(["harborctl", "rp_repos", "--policy", "/etc/rp.yaml", "-v"]).unwrap();
        assert!(matches!(cli.command, Command::RpRepos));
        assert_eq!(cli.policy, PathBuf::from("/etc/rp.yaml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Backlog tracker: document store on `SQLite` with a REST API
#[derive(Parser, Debug)]
#[command(name = "yabt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ./yabt.db)
    #[arg(long, global = true, env = "YABT_DB")]
    pub db: Option<PathBuf>,

    /// Project config file (default: ./yabt.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Acting user id for commands that record history
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Manage backlog items
    #[command(alias = "items")]
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Manage comments on backlog items
    #[command(alias = "comments")]
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Manage users
    #[command(alias = "users")]
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage custom field definitions
    #[command(alias = "fields")]
    Field {
        #[command(subcommand)]
        command: FieldCommands,
    },

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind (host:port)
    #[arg(long)]
    pub bind: Option<String>,

    /// Allow requests from any origin
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Arguments for the completions command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    PowerShell,
    Elvish,
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Create a backlog item
    Create(ItemCreateArgs),

    /// List backlog items
    #[command(alias = "ls")]
    List(ItemListArgs),

    /// Show one item in full
    Show {
        /// Item id (e.g. 12-A)
        id: String,
    },

    /// Update an item (unset flags keep their current values)
    Update(ItemUpdateArgs),

    /// Delete an item and the links other items hold to it
    #[command(alias = "rm")]
    Delete {
        id: String,
    },

    /// Change an item's state
    State {
        id: String,
        /// proposed, new, ready, inProgress, done or closed
        state: String,
    },

    /// Assign an item (omit the user to unassign)
    Assign {
        id: String,
        user: Option<String>,
    },

    /// List tags with item counts
    Tags(ItemTagsArgs),
}

/// Content flags shared by `item create` and `item update`.
#[derive(Args, Debug, Clone, Default)]
pub struct ItemContentArgs {
    /// Estimated size (story points)
    #[arg(long)]
    pub size: Option<f64>,

    /// Assignee user id
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Related item as ID or ID:linkType (repeatable)
    #[arg(long = "related", short = 'r')]
    pub related: Vec<String>,

    /// Custom field value as FIELD_ID=VALUE (repeatable; VALUE may be JSON)
    #[arg(long = "field", short = 'f')]
    pub fields: Vec<String>,

    /// Bug severity: critical, major, minor or trivial
    #[arg(long)]
    pub severity: Option<String>,

    /// Bug priority: p1 to p4
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Bug reproduction steps
    #[arg(long)]
    pub steps: Option<String>,

    /// Acceptance criteria (bugs and user stories)
    #[arg(long)]
    pub acceptance: Option<String>,

    /// Description (tasks and features)
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ItemCreateArgs {
    /// Item title
    pub title: String,

    /// Item type: bug, userStory, task or feature
    #[arg(long = "type", short = 't', default_value = "task")]
    pub item_type: String,

    /// Tags (comma separated)
    #[arg(long = "tag", short = 'l', value_delimiter = ',')]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub content: ItemContentArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ItemUpdateArgs {
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// Remove the assignee
    #[arg(long, conflicts_with = "assignee")]
    pub unassign: bool,

    /// Clear the estimated size
    #[arg(long, conflicts_with = "size")]
    pub clear_size: bool,

    /// Tags to add (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub add_tag: Vec<String>,

    /// Tags to remove (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub remove_tag: Vec<String>,

    /// Related item ids to unlink (repeatable)
    #[arg(long)]
    pub unrelate: Vec<String>,

    /// Custom field ids whose values to remove (repeatable)
    #[arg(long)]
    pub clear_field: Vec<String>,

    #[command(flatten)]
    pub content: ItemContentArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ItemListArgs {
    /// Match title text or item number
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Filter by type
    #[arg(long = "type", short = 't')]
    pub item_type: Option<String>,

    /// Filter by state (comma separated)
    #[arg(long)]
    pub state: Option<String>,

    /// Filter by tag (comma separated, all must match)
    #[arg(long)]
    pub tag: Option<String>,

    /// Filter by assignee id
    #[arg(long)]
    pub assignee: Option<String>,

    /// Items the acting user is related to
    #[arg(long, value_enum)]
    pub mine: Option<RelationArg>,

    /// Sort field
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Page index (0-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// Page size
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum RelationArg {
    Assigned,
    Created,
    Modified,
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SortArg {
    Number,
    Title,
    Assignee,
    Created,
    Updated,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ItemTagsArgs {
    /// Only tags containing this text
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Maximum number of tags
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Add a comment
    Add {
        item: String,
        message: String,
    },

    /// Edit one of your comments
    Edit {
        item: String,
        comment: String,
        message: String,
    },

    /// Delete one of your comments
    Delete {
        item: String,
        comment: String,
    },

    /// List comments, newest first
    List {
        item: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserFieldsArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Avatar image URL (http or https)
    #[arg(long)]
    pub avatar: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a user
    Add(UserFieldsArgs),

    /// Update a user; references in backlog items follow a rename
    Update {
        id: String,
        #[command(flatten)]
        fields: UserFieldsArgs,
    },

    /// Delete a user; references in backlog items are cleared
    Delete {
        id: String,
    },

    /// List users
    List(UserListArgs),

    /// Show one user
    Show {
        id: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserListArgs {
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort by email instead of name
    #[arg(long)]
    pub by_email: bool,

    #[arg(long, short = 'r')]
    pub reverse: bool,

    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum FieldCommands {
    /// Define a custom field
    Add {
        name: String,

        /// text, numeric, date, checkbox or url
        #[arg(long = "type", short = 't')]
        field_type: String,

        #[arg(long)]
        mandatory: bool,

        /// Item types the field applies to (comma separated; default all)
        #[arg(long = "for", value_delimiter = ',')]
        item_types: Vec<String>,
    },

    /// Update a custom field (the type is fixed)
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        mandatory: Option<bool>,

        #[arg(long = "for", value_delimiter = ',')]
        item_types: Option<Vec<String>>,
    },

    /// Delete a custom field and its values
    Delete {
        id: String,
    },

    /// List custom fields
    List {
        /// Only fields applying to this item type
        #[arg(long = "for")]
        item_type: Option<String>,

        #[arg(long)]
        mandatory: Option<bool>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_item_create() {
        let cli = Cli::parse_from([
            "yabt", "--user", "1-A", "item", "create", "Fix login", "-t", "bug", "--tag", "ui,auth",
            "--related", "2-A:blocks",
        ]);
        let Commands::Item {
            command: ItemCommands::Create(args),
        } = cli.command
        else {
            panic!("expected item create");
        };
        assert_eq!(cli.user.as_deref(), Some("1-A"));
        assert_eq!(args.item_type, "bug");
        assert_eq!(args.tags, vec!["ui", "auth"]);
        assert_eq!(args.content.related, vec!["2-A:blocks"]);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["yabt", "user", "list", "--json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}

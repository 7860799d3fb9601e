use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use chronicle::{
    Database, JournalService, RepoError, SortOrder, Story, StoryBuilder, StoryId, StoryQuery, Tag,
    TagId,
};

/// chronicle - a personal journal kept on a local timeline
#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Record and browse timeline stories with colored tags")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new story
    Add(AddCommand),
    /// List stories on the timeline
    List(ListCommand),
    /// Show one story
    Show(ShowCommand),
    /// Edit an existing story
    Edit(EditCommand),
    /// Remove a story
    Rm(RmCommand),
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Destroy all data and start over
    Reset(ResetCommand),
    /// Browse the timeline in the terminal
    Tui,
}

#[derive(Parser)]
struct AddCommand {
    /// Story headline
    #[arg(value_name = "TITLE")]
    title: String,

    /// When it happened: RFC 3339 or Unix milliseconds (default: now)
    #[arg(long, value_name = "WHEN")]
    at: Option<String>,

    /// Body text
    #[arg(short, long, default_value = "")]
    detail: String,

    /// Tag ids to attach (repeatable)
    #[arg(short, long = "tag", value_name = "TAG_ID")]
    tags: Vec<i64>,

    /// Display color
    #[arg(short, long, default_value = "")]
    color: String,
}

#[derive(Parser)]
struct ListCommand {
    /// Lower bound on the event time (RFC 3339 or Unix milliseconds)
    #[arg(long, value_name = "WHEN")]
    from: Option<String>,

    /// Upper bound on the event time (RFC 3339 or Unix milliseconds)
    #[arg(long, value_name = "WHEN")]
    to: Option<String>,

    /// Oldest first instead of newest first
    #[arg(long)]
    asc: bool,

    /// Only stories carrying any of these tags (repeatable)
    #[arg(long = "tag", value_name = "TAG_ID")]
    tags: Vec<i64>,

    /// Page size
    #[arg(short, long, default_value_t = 20)]
    limit: u64,

    /// Records to skip before the page starts
    #[arg(short, long, default_value_t = 0)]
    offset: u64,

    /// Print stories as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ShowCommand {
    #[arg(value_name = "STORY_ID")]
    id: i64,

    /// Print the story as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct EditCommand {
    #[arg(value_name = "STORY_ID")]
    id: i64,

    #[arg(long)]
    title: Option<String>,

    /// New event time (RFC 3339 or Unix milliseconds)
    #[arg(long, value_name = "WHEN")]
    at: Option<String>,

    #[arg(long)]
    detail: Option<String>,

    #[arg(long)]
    color: Option<String>,

    /// Replace the attached tags (repeatable; pass none to keep current)
    #[arg(long = "tag", value_name = "TAG_ID")]
    tags: Vec<i64>,

    /// Archive or unarchive the story
    #[arg(long)]
    archived: Option<bool>,
}

#[derive(Parser)]
struct RmCommand {
    #[arg(value_name = "STORY_ID")]
    id: i64,
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a tag
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "")]
        color: String,
    },
    /// List all tags
    List {
        #[arg(long)]
        json: bool,
    },
    /// Edit a tag
    Edit {
        #[arg(value_name = "TAG_ID")]
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a tag (stories keep the dangling reference)
    Rm {
        #[arg(value_name = "TAG_ID")]
        id: i64,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the current settings
    Show,
    /// Change language and/or theme
    Set {
        /// en, zh-TW, or ja
        #[arg(long)]
        lang: Option<String>,
        /// light or dark
        #[arg(long)]
        theme: Option<String>,
    },
}

#[derive(Parser)]
struct ResetCommand {
    /// Required confirmation; reset deletes every story, tag, and setting
    #[arg(long)]
    yes: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tui => chronicle::tui::run(),
        command => run_command(command),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// Validation and conflict failures are resubmittable; store failures
/// and I/O errors are internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    if let Some(repo) = error.downcast_ref::<RepoError>() {
        return repo.is_user_error();
    }
    error.to_string().contains("cannot be empty")
}

fn run_command(command: Commands) -> Result<()> {
    let db_path = chronicle::utils::get_database_path()?;
    chronicle::utils::ensure_database_directory(&db_path)?;
    let db = Database::open(&db_path).context("Failed to open database")?;
    let mut service = JournalService::new(db);

    let output = match command {
        Commands::Add(cmd) => execute_add(&service, &cmd)?,
        Commands::List(cmd) => execute_list(&service, &cmd)?,
        Commands::Show(cmd) => execute_show(&service, &cmd)?,
        Commands::Edit(cmd) => execute_edit(&service, &cmd)?,
        Commands::Rm(cmd) => execute_rm(&service, &cmd)?,
        Commands::Tag { command } => execute_tag(&service, command)?,
        Commands::Settings { command } => execute_settings(&service, command)?,
        Commands::Reset(cmd) => execute_reset(&mut service, &cmd)?,
        Commands::Tui => unreachable!("handled in main"),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Parses a point in time given as RFC 3339 or raw Unix milliseconds.
fn parse_timestamp(input: &str) -> Result<i64> {
    if let Ok(ms) = input.parse::<i64>() {
        return Ok(ms);
    }
    let parsed = OffsetDateTime::parse(input, &Rfc3339)
        .with_context(|| format!("'{input}' is neither Unix milliseconds nor RFC 3339"))?;
    Ok((parsed.unix_timestamp_nanos() / 1_000_000) as i64)
}

/// Formats Unix milliseconds as RFC 3339 for display.
fn format_timestamp(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| ms.to_string())
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn format_story_line(story: &Story) -> String {
    let id = story.id.map(|i| i.get()).unwrap_or_default();
    let archived = if story.is_archived { " [archived]" } else { "" };
    format!(
        "{:>4}  {}  {}{}",
        id,
        format_timestamp(story.happened_at),
        story.title,
        archived
    )
}

fn execute_add(service: &JournalService, cmd: &AddCommand) -> Result<String> {
    if cmd.title.trim().is_empty() {
        anyhow::bail!("Story title cannot be empty");
    }

    let happened_at = match &cmd.at {
        Some(at) => parse_timestamp(at)?,
        None => now_ms(),
    };

    let story = service.insert_story(
        StoryBuilder::new()
            .title(cmd.title.clone())
            .happened_at(happened_at)
            .detail(cmd.detail.clone())
            .tag_ids(cmd.tags.iter().copied().map(TagId::new).collect())
            .color(cmd.color.clone())
            .build(),
    )?;

    Ok(format!(
        "Added story {} ({})",
        story.id.expect("insert assigns an id"),
        story.title
    ))
}

fn execute_list(service: &JournalService, cmd: &ListCommand) -> Result<String> {
    let query = StoryQuery {
        from: cmd.from.as_deref().map(parse_timestamp).transpose()?,
        to: cmd.to.as_deref().map(parse_timestamp).transpose()?,
        order: if cmd.asc {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        },
        tags: if cmd.tags.is_empty() {
            None
        } else {
            Some(cmd.tags.iter().copied().map(TagId::new).collect())
        },
    };

    let total = service.count_stories(&query)?;
    let page = service.fetch_story_page(&query, cmd.offset, cmd.limit)?;

    if cmd.json {
        return Ok(serde_json::to_string_pretty(&page)?);
    }

    let mut lines: Vec<String> = page.iter().map(format_story_line).collect();
    lines.push(format!(
        "showing {} of {} (offset {})",
        page.len(),
        total,
        cmd.offset
    ));
    Ok(lines.join("\n"))
}

fn execute_show(service: &JournalService, cmd: &ShowCommand) -> Result<String> {
    let story = service
        .story_by_id(StoryId::new(cmd.id))?
        .ok_or_else(|| anyhow::anyhow!("No story with id {}", cmd.id))?;

    if cmd.json {
        return Ok(serde_json::to_string_pretty(&story)?);
    }

    let mut tag_names = Vec::new();
    for tag_id in &story.tag_ids {
        // Dangling references render as not-found, never as an error
        match service.tag_by_id(*tag_id)? {
            Some(tag) => tag_names.push(tag.name),
            None => tag_names.push(format!("#{tag_id} (tag not found)")),
        }
    }

    let mut out = vec![
        format_story_line(&story),
        format!("tags: {}", if tag_names.is_empty() {
            "-".to_string()
        } else {
            tag_names.join(", ")
        }),
    ];
    if !story.detail.is_empty() {
        out.push(String::new());
        out.push(story.detail.clone());
    }
    Ok(out.join("\n"))
}

fn execute_edit(service: &JournalService, cmd: &EditCommand) -> Result<String> {
    let mut story = service
        .story_by_id(StoryId::new(cmd.id))?
        .ok_or_else(|| RepoError::Conflict("not found".to_string()))?;

    if let Some(title) = &cmd.title {
        story.title = title.clone();
    }
    if let Some(at) = &cmd.at {
        story.happened_at = parse_timestamp(at)?;
    }
    if let Some(detail) = &cmd.detail {
        story.detail = detail.clone();
    }
    if let Some(color) = &cmd.color {
        story.color = color.clone();
    }
    if !cmd.tags.is_empty() {
        story.tag_ids = cmd.tags.iter().copied().map(TagId::new).collect();
    }
    if let Some(archived) = cmd.archived {
        story.is_archived = archived;
    }

    // Claim the next version; a concurrent writer since the read above
    // still loses the optimistic check inside update_story
    story.version = Some(story.version.unwrap_or(0) + 1);
    let updated = service.update_story(story)?;

    Ok(format!(
        "Updated story {} (version {})",
        cmd.id,
        updated.version.expect("update assigns a version")
    ))
}

fn execute_rm(service: &JournalService, cmd: &RmCommand) -> Result<String> {
    let story = service
        .story_by_id(StoryId::new(cmd.id))?
        .ok_or_else(|| anyhow::anyhow!("No story with id {}", cmd.id))?;
    service.delete_story(&story)?;
    Ok(format!("Removed story {}", cmd.id))
}

fn execute_tag(service: &JournalService, command: TagCommands) -> Result<String> {
    match command {
        TagCommands::Add {
            name,
            description,
            color,
        } => {
            if name.trim().is_empty() {
                anyhow::bail!("Tag name cannot be empty");
            }
            let tag = service.insert_tag(
                Tag::new(name).with_description(description).with_color(color),
            )?;
            Ok(format!(
                "Added tag {} ({})",
                tag.id.expect("insert assigns an id"),
                tag.name
            ))
        }
        TagCommands::List { json } => {
            let tags = service.all_tags()?;
            if json {
                return Ok(serde_json::to_string_pretty(&tags)?);
            }
            Ok(tags
                .iter()
                .map(|t| {
                    format!(
                        "{:>4}  {}  {}",
                        t.id.map(|i| i.get()).unwrap_or_default(),
                        t.name,
                        t.description
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        TagCommands::Edit {
            id,
            name,
            description,
            color,
        } => {
            let mut tag = service
                .tag_by_id(TagId::new(id))?
                .ok_or_else(|| RepoError::Conflict("not found".to_string()))?;
            if let Some(name) = name {
                tag.name = name;
            }
            if let Some(description) = description {
                tag.description = description;
            }
            if let Some(color) = color {
                tag.color = color;
            }
            tag.version = Some(tag.version.unwrap_or(0) + 1);
            let updated = service.update_tag(tag)?;
            Ok(format!(
                "Updated tag {} (version {})",
                id,
                updated.version.expect("update assigns a version")
            ))
        }
        TagCommands::Rm { id } => {
            let tag = service
                .tag_by_id(TagId::new(id))?
                .ok_or_else(|| anyhow::anyhow!("No tag with id {id}"))?;
            service.delete_tag(&tag)?;
            Ok(format!("Removed tag {id} (stories keep the reference)"))
        }
    }
}

fn execute_settings(service: &JournalService, command: SettingsCommands) -> Result<String> {
    match command {
        SettingsCommands::Show => {
            let settings = service.ensure_settings()?;
            Ok(format!(
                "lang: {}\ntheme: {}",
                settings.lang, settings.theme
            ))
        }
        SettingsCommands::Set { lang, theme } => {
            let mut settings = service.ensure_settings()?;
            if let Some(lang) = lang {
                settings.lang = lang
                    .parse()
                    .map_err(|m: String| RepoError::Validation(m))?;
            }
            if let Some(theme) = theme {
                settings.theme = theme
                    .parse()
                    .map_err(|m: String| RepoError::Validation(m))?;
            }
            let saved = service.update_settings(settings)?;
            Ok(format!("lang: {}\ntheme: {}", saved.lang, saved.theme))
        }
    }
}

fn execute_reset(service: &mut JournalService, cmd: &ResetCommand) -> Result<String> {
    if !cmd.yes {
        anyhow::bail!("Refusing to reset without --yes; this deletes every story, tag, and setting");
    }
    service.reset()?;
    Ok("Database reset".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JournalService {
        let db = Database::in_memory().expect("failed to create in-memory database");
        JournalService::new(db)
    }

    #[test]
    fn parse_timestamp_accepts_unix_milliseconds() {
        assert_eq!(parse_timestamp("1650000000000").unwrap(), 1_650_000_000_000);
        assert_eq!(parse_timestamp("-5").unwrap(), -5);
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        let ms = parse_timestamp("1970-01-01T00:00:01Z").unwrap();
        assert_eq!(ms, 1000);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        let result = parse_timestamp("yesterday");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("yesterday"));
    }

    #[test]
    fn format_timestamp_round_trips() {
        let rendered = format_timestamp(1000);
        assert_eq!(parse_timestamp(&rendered).unwrap(), 1000);
    }

    #[test]
    fn title_validation_rejects_empty_string() {
        let cmd = AddCommand {
            title: "   ".to_string(),
            at: None,
            detail: String::new(),
            tags: Vec::new(),
            color: String::new(),
        };
        let result = execute_add(&service(), &cmd);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn story_line_marks_archived_entries() {
        let story = StoryBuilder::new()
            .id(StoryId::new(3))
            .title("Old chapter")
            .happened_at(1000)
            .is_archived(true)
            .build();
        let line = format_story_line(&story);
        assert!(line.contains("Old chapter"));
        assert!(line.contains("[archived]"));
    }

    #[test]
    fn user_errors_map_to_exit_code_one() {
        let conflict: anyhow::Error = RepoError::Conflict("stale version".into()).into();
        assert!(is_user_error(&conflict));

        let internal: anyhow::Error = RepoError::Persistence("disk full".into()).into();
        assert!(!is_user_error(&internal));
    }
}

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinnote_core::config::{
    fetch_timeout_from_env_value, font_size_from_env_value, key_style_from_env_value,
};
use clinnote_core::constants::{
    DEFAULT_FONT_FAMILY, DEFAULT_LINE_HEIGHT_PT, DEFAULT_TEMPLATE_DIR, KNOWN_DIAGNOSES,
};
use clinnote_core::{
    CoreConfig, CriticalCareReason, EmptyPlanPolicy, FragmentSource, LocalFragmentSource,
    NoteError, NoteRequest, NoteResult, NoteService, Phrase, PhraseReplacement, RemoteFragmentSource, TemplateCategory,
    Typography, ValidationPolicy,
};
use clinnote_types::NonEmptyText;

#[derive(Parser)]
#[command(name = "clinnote")]
#[command(about = "Clinical progress note assembler")]
struct Cli {
    /// Local template directory (overrides CLINNOTE_TEMPLATE_DIR)
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    Local,
    Remote,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a progress note document
    Assemble {
        /// YAML file with the note form input; flags below override its fields
        #[arg(long)]
        request: Option<PathBuf>,
        /// Diagnosis label, repeat in the order they should be numbered
        #[arg(long = "diagnosis")]
        diagnoses: Vec<String>,
        #[arg(long)]
        assessment: Option<String>,
        #[arg(long)]
        plan: Option<String>,
        #[arg(long)]
        overnight_events: Option<String>,
        /// Critical care reason name (see `clinnote critical-care`)
        #[arg(long)]
        critical_care: Option<String>,
        /// Critical care time, e.g. `35`
        #[arg(long)]
        critical_care_time: Option<String>,
        /// Review of systems template label, or `None`
        #[arg(long)]
        ros: Option<String>,
        /// Physical exam template label, e.g. `Day 1`
        #[arg(long)]
        exam_day: Option<String>,
        /// Room number, used as the file name
        #[arg(long)]
        room: Option<String>,
        /// Leave out the intro attestation
        #[arg(long)]
        no_intro: bool,
        #[arg(long, value_enum, default_value_t = SourceKind::Local)]
        source: SourceKind,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Require diagnoses and a room number
        #[arg(long)]
        strict: bool,
        /// Keep the PLAN: heading when there is nothing under it
        #[arg(long)]
        keep_empty_plan: bool,
    },
    /// Replace a stock phrase throughout a note
    Update {
        /// Note text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// File containing the note text
        #[arg(long)]
        file: Option<PathBuf>,
        /// Phrase to replace (see `clinnote phrases`)
        #[arg(long)]
        from: String,
        /// Replacement phrase
        #[arg(long)]
        to: String,
        /// Also write the updated note as a document at this path
        #[arg(long)]
        docx: Option<PathBuf>,
    },
    /// List templates available in a category (diagnoses, ros, physicalexam)
    List {
        category: String,
        #[arg(long, value_enum, default_value_t = SourceKind::Local)]
        source: SourceKind,
    },
    /// List the replaceable phrases
    Phrases,
    /// List the critical care reasons
    CriticalCare,
    /// List the diagnoses offered by the note form
    Diagnoses,
}

/// Form fields given as flags.
#[derive(Default)]
struct FormFlags {
    diagnoses: Vec<String>,
    assessment: Option<String>,
    plan: Option<String>,
    overnight_events: Option<String>,
    critical_care: Option<String>,
    critical_care_time: Option<String>,
    ros: Option<String>,
    exam_day: Option<String>,
    room: Option<String>,
    no_intro: bool,
}

impl FormFlags {
    /// Overlays the flags that were given onto `request`.
    fn apply(self, mut request: NoteRequest) -> anyhow::Result<NoteRequest> {
        if !self.diagnoses.is_empty() {
            request.diagnoses = self.diagnoses;
        }
        if let Some(reason) = self.critical_care {
            request.critical_care = Some(reason.parse::<CriticalCareReason>()?);
        }
        request.assessment = self.assessment.or(request.assessment);
        request.plan = self.plan.or(request.plan);
        request.overnight_events = self.overnight_events.or(request.overnight_events);
        request.critical_care_time = self.critical_care_time.or(request.critical_care_time);
        request.ros = self.ros.or(request.ros);
        request.exam_day = self.exam_day.or(request.exam_day);
        request.room_number = self.room.or(request.room_number);
        if self.no_intro {
            request.include_intro = false;
        }
        Ok(request)
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinnote=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Assemble {
            request,
            diagnoses,
            assessment,
            plan,
            overnight_events,
            critical_care,
            critical_care_time,
            ros,
            exam_day,
            room,
            no_intro,
            source,
            out_dir,
            strict,
            keep_empty_plan,
        }) => {
            let mut cfg = load_config(cli.template_dir)?;
            if strict {
                cfg = cfg.with_validation_policy(ValidationPolicy::strict());
            }
            if keep_empty_plan {
                cfg = cfg.with_empty_plan_policy(EmptyPlanPolicy::KeepHeading);
            }

            let base = match request {
                Some(path) => NoteRequest::load(&path)
                    .with_context(|| format!("cannot load request {}", path.display()))?,
                None => NoteRequest::default(),
            };
            let flags = FormFlags {
                diagnoses,
                assessment,
                plan,
                overnight_events,
                critical_care,
                critical_care_time,
                ros,
                exam_day,
                room,
                no_intro,
            };
            let request = flags.apply(base)?;

            let templates = fragment_source(source, &cfg)?;
            let service = NoteService::new(cfg);
            let artifact = service.render(&request, templates.as_ref())?;

            let path = write_atomic(&out_dir, &artifact.file_name, &artifact.bytes)
                .with_context(|| format!("cannot write note to {}", out_dir.display()))?;
            tracing::info!("wrote {}", path.display());
            println!("{}", path.display());
        }
        Some(Commands::Update {
            text,
            file,
            from,
            to,
            docx,
        }) => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?,
                (None, None) => bail!("either --text or --file is required"),
            };
            let rule = PhraseReplacement::new(from.parse::<Phrase>()?, to.parse::<Phrase>()?);

            let service = NoteService::new(load_config(cli.template_dir)?);
            let updated = service.render_update(&text, &rule)?;
            println!("{}", updated.text);

            if let Some(target) = docx {
                let (dir, name) = split_target(&target, &updated.artifact.file_name);
                let path = write_atomic(&dir, &name, &updated.artifact.bytes)
                    .with_context(|| format!("cannot write note to {}", dir.display()))?;
                tracing::info!("wrote {}", path.display());
            }
        }
        Some(Commands::List { category, source }) => {
            let category: TemplateCategory = category.parse()?;
            let cfg = load_config(cli.template_dir)?;
            let templates = fragment_source(source, &cfg)?;
            let service = NoteService::new(cfg);

            let listings = service.list_templates(templates.as_ref(), category)?;
            if listings.is_empty() {
                println!("No {} templates found.", category);
            }
            for listing in listings {
                println!("{}\t{}\t{}", listing.label, listing.key, listing.location);
            }
        }
        Some(Commands::Phrases) => {
            for phrase in Phrase::ALL {
                println!("{}\t{}", phrase.name(), phrase);
            }
        }
        Some(Commands::CriticalCare) => {
            for reason in CriticalCareReason::ALL {
                println!("{}\t{}", reason.name(), reason.text());
            }
        }
        Some(Commands::Diagnoses) => {
            for diagnosis in KNOWN_DIAGNOSES {
                println!("{}", diagnosis);
            }
        }
        None => {
            println!("No command given. Run `clinnote --help` for usage.");
        }
    }

    Ok(())
}

/// Resolves configuration from the environment once, at startup.
fn load_config(template_dir: Option<PathBuf>) -> anyhow::Result<CoreConfig> {
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    let template_dir = template_dir
        .or_else(|| env("CLINNOTE_TEMPLATE_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR));

    let font_family =
        env("CLINNOTE_FONT_FAMILY").unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_owned());
    let typography = Typography::new(
        &font_family,
        font_size_from_env_value(env("CLINNOTE_FONT_SIZE_PT"))?,
        DEFAULT_LINE_HEIGHT_PT,
    )?;

    let mut cfg = CoreConfig::new(template_dir)
        .with_fetch_timeout(fetch_timeout_from_env_value(env(
            "CLINNOTE_FETCH_TIMEOUT_SECS",
        ))?)
        .with_typography(typography)
        .with_key_style(key_style_from_env_value(env("CLINNOTE_KEY_STYLE"))?);

    if let Some(intro) = NonEmptyText::optional(env("CLINNOTE_INTRO_TEXT")) {
        cfg = cfg.with_intro_text(intro);
    }

    if let Some(base_url) = env("CLINNOTE_TEMPLATE_BASE_URL") {
        let listing_url = env("CLINNOTE_TEMPLATE_LISTING_URL");
        cfg = cfg.with_remote(&base_url, listing_url.as_deref())?;
    }

    Ok(cfg)
}

fn fragment_source(kind: SourceKind, cfg: &CoreConfig) -> anyhow::Result<Box<dyn FragmentSource>> {
    let source: Box<dyn FragmentSource> = match kind {
        SourceKind::Local => Box::new(LocalFragmentSource::new(
            cfg.template_dir(),
            cfg.key_style(),
        )?),
        SourceKind::Remote => Box::new(
            RemoteFragmentSource::from_config(cfg)
                .context("set CLINNOTE_TEMPLATE_BASE_URL to use remote templates")?,
        ),
    };
    Ok(source)
}

/// Splits a `--docx` target into directory and file name; a directory gets the default name.
fn split_target(target: &Path, default_name: &str) -> (PathBuf, String) {
    if target.is_dir() {
        return (target.to_path_buf(), default_name.to_owned());
    }
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| default_name.to_owned());
    (dir, name)
}

/// Writes `bytes` to `dir/file_name` through a temporary file in the same directory, so a
/// failed write never leaves a partial document behind.
fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> NoteResult<PathBuf> {
    fs::create_dir_all(dir).map_err(NoteError::FileWrite)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(NoteError::FileWrite)?;
    temp.write_all(bytes).map_err(NoteError::FileWrite)?;
    temp.as_file().sync_all().map_err(NoteError::FileWrite)?;

    let target = dir.join(file_name);
    temp.persist(&target)
        .map_err(|e| NoteError::FileWrite(e.error))?;
    tracing::debug!("persisted {}", target.display());
    Ok(target)
}

use bookmeta::epub::config::DEFAULT_CONFIG_PATH;
use bookmeta::{FieldValue, FilenameComposer, MetaValue, MetadataDict, ReaderConfig, Result, read_metadata, rename_file};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// 📚 BookMeta - EPUB元数据查看与重命名工具
#[derive(Parser)]
#[command(name = "bookmeta")]
#[command(about = "列出EPUB元数据，或按元数据规范化重命名EPUB文件")]
#[command(version)]
struct Args {
    /// 详细输出模式
    #[arg(short, long, global = true, help = "输出调试日志")]
    verbose: bool,

    /// 配置文件路径
    #[arg(short, long, global = true, help = "YAML配置文件路径（不指定则使用默认配置）")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 逐字段显示元数据
    #[command(visible_alias = "list")]
    Info {
        /// EPUB文件路径
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 以单行原始格式显示元数据
    Raw {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 按 "<姓氏> (<年份>) <短标题> (isbn<ISBN>).epub" 重命名文件
    Rename {
        /// 只显示新文件名，不实际重命名
        #[arg(long)]
        dry_run: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 生成默认配置文件
    InitConfig {
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let (files, action) = match args.command {
        Command::InitConfig { path } => {
            return match ReaderConfig::generate_default_config(&path) {
                Ok(()) => {
                    println!("✅ 已生成配置文件: {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("❌ 错误: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Command::Info { files } => (files, Action::Info),
        Command::Raw { files } => (files, Action::Raw),
        Command::Rename { dry_run, files } => (files, Action::Rename { dry_run }),
    };

    let config = match ReaderConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let composer = FilenameComposer::new(config.unknown.clone());
    let mut failures = 0usize;
    for path in &files {
        println!("* 正在读取 '{}' ...", path.display());
        if let Err(e) = process_epub(path, &config, &composer, action) {
            eprintln!("❌ {}: {}", path.display(), e);
            failures += 1;
        }
    }

    if failures > 0 {
        eprintln!("⚠️  {} 个文件处理失败", failures);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[derive(Clone, Copy)]
enum Action {
    Info,
    Raw,
    Rename { dry_run: bool },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

/// 处理单个EPUB文件；归档在元数据提取完成后即被释放
fn process_epub(path: &Path, config: &ReaderConfig, composer: &FilenameComposer, action: Action) -> Result<()> {
    let Some(metadata) = read_metadata(path, config)? else {
        match action {
            Action::Rename { .. } => println!("  ⚠️  没有找到元数据，跳过重命名"),
            _ => println!("  ⚠️  没有找到元数据"),
        }
        return Ok(());
    };

    match action {
        Action::Info => print!("{}", dump_metadata(path, &metadata)),
        Action::Raw => println!("{}", metadata),
        Action::Rename { dry_run } => {
            let new_name = composer.compose(&metadata);
            println!("{}", new_name);
            if !dry_run {
                let target = rename_file(path, &new_name)?;
                if target == path {
                    println!("  ✅ 已是规范文件名");
                } else {
                    println!("  ✅ 已重命名为 {}", target.display());
                }
            }
        }
    }
    Ok(())
}

/// 逐字段输出元数据：字段名、值和属性
fn dump_metadata(path: &Path, metadata: &MetadataDict) -> String {
    let mut buf = String::new();
    let _ = writeln!(buf, "----");
    let _ = writeln!(buf, "- path: {}", path.display());
    for (field, value) in metadata.fields() {
        match value {
            FieldValue::Single(v) => {
                let _ = writeln!(buf, "- {}: {}{}", field, v, format_attributes(v));
            }
            FieldValue::Multiple(values) => {
                let _ = writeln!(buf, "- {}:", field);
                for v in values {
                    let _ = writeln!(buf, "\t- {}{}", v, format_attributes(v));
                }
            }
        }
    }
    buf.push('\n');
    buf
}

fn format_attributes(value: &MetaValue) -> String {
    if value.attributes().is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = value
        .attributes()
        .iter()
        .map(|(k, v)| format!("{}='{}'", k, v))
        .collect();
    format!(" ({})", pairs.join(", "))
}

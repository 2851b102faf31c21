//! Hivekeep - Entry Point
//!
//! A line-oriented front end over the placement engine. It loads an optional
//! snapshot file, signs in an optional user and then reads commands until
//! `quit`. With `--data` every committed change is written back to the file
//! in the background.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use hivekeep::audit::AuditLog;
use hivekeep::core::clock::SystemClock;
use hivekeep::core::config::EngineConfig;
use hivekeep::core::error::{HivekeepError, Result};
use hivekeep::core::types::{ApiaryId, EntityType, HiveId, NucleusId, PalletId, Position};
use hivekeep::engine::PlacementEngine;
use hivekeep::entity::{HiveSpec, NewApiary, NewUser, NucleusSpec, PromotionTarget, Role};
use hivekeep::placement::{MoveOutcome, MoveRequest};
use hivekeep::state::{Loader, Yard};
use hivekeep::store::{JsonFileStore, StoreWriter};

#[derive(Parser, Debug)]
#[command(name = "hivekeep")]
#[command(about = "Track apiaries, pallets, hives and nuclei")]
struct Args {
    /// Snapshot file to load and keep up to date
    #[arg(long)]
    data: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Username to act as (must exist in the snapshot)
    #[arg(long)]
    user: Option<String>,
}

struct Session {
    engine: PlacementEngine,
    apiary: Option<ApiaryId>,
}

fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "hivekeep=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    tracing::info!("Hivekeep starting...");

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_toml(path)?,
        None => EngineConfig::default(),
    };

    // Runtime for the background store writer
    let rt = Runtime::new()?;

    let mut yard = Yard::new();
    let mut audit = AuditLog::new();
    let mut writer = None;
    if let Some(path) = &args.data {
        let loader = Loader::new(&config, &SystemClock);
        let store = JsonFileStore::open(path, &loader)?;
        yard = store.yard().clone();
        audit = AuditLog::from(store.audit().to_vec());

        let _guard = rt.enter();
        writer = Some(StoreWriter::spawn(store));
    }

    let mut engine = PlacementEngine::new(yard, config)?.with_audit(audit);
    if let Some(writer) = &writer {
        engine = engine.with_sink(writer.sink());
    }
    if let Some(username) = &args.user {
        engine.sign_in(username)?;
    }

    let mut session = Session {
        apiary: engine.yard().apiaries().first().map(|a| a.id),
        engine,
    };

    println!("\n=== HIVEKEEP ===");
    println!("Signed in as {}", session.engine.actor_name());
    print_help();

    loop {
        print!("{}> ", session.prompt());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((command, rest)) = words.split_first() else {
            continue;
        };

        if matches!(*command, "quit" | "q") {
            break;
        }
        if let Err(e) = session.run(command, rest) {
            println!("error: {}", e);
        }
    }

    let yard = session.engine.into_yard();
    tracing::info!(
        apiaries = yard.apiaries().len(),
        hives = yard.hives().len(),
        "Session closed"
    );
    if let Some(writer) = writer {
        rt.block_on(writer.shutdown())?;
        tracing::info!("Snapshot saved");
    }

    Ok(())
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  apiaries                       - List apiaries");
    println!("  apiary <name>                  - Create an apiary");
    println!("  use <name|number>              - Select an apiary");
    println!("  pallets                        - List pallets of the apiary");
    println!("  pallet [capacity]              - Create a pallet");
    println!("  show <code>                    - Show the slots of a pallet");
    println!("  add <code> [chambers]          - Add a hive to a pallet");
    println!("  move <hive> <code> [position]  - Move or swap a hive");
    println!("  remove <hive>                  - Remove a hive");
    println!("  nuclei                         - List nuclei of the apiary");
    println!("  nucleus                        - Add a nucleus");
    println!("  promote <nucleus> <code> [ch]  - Promote a nucleus to a hive");
    println!("  varroa <hive> <mites> <bees>   - Record a varroa sample");
    println!("  census                         - Hive counts per status");
    println!("  users                          - List users");
    println!("  user <username> <role> <name>  - Create a user (admin|beekeeper)");
    println!("  toggle <username>              - Enable or disable a user");
    println!("  audit [n]                      - Show recent audit entries");
    println!("  quit / q                       - Exit");
    println!();
}

fn usage(text: &str) -> HivekeepError {
    HivekeepError::InvalidAttribute(format!("usage: {}", text))
}

fn parse_number<T: std::str::FromStr>(word: &str, what: &str) -> Result<T> {
    word.parse()
        .map_err(|_| HivekeepError::InvalidAttribute(format!("{} must be a number", what)))
}

impl Session {
    fn prompt(&self) -> String {
        self.apiary
            .and_then(|id| self.engine.yard().apiary(id))
            .map(|a| a.name.clone())
            .unwrap_or_default()
    }

    fn current_apiary(&self) -> Result<ApiaryId> {
        self.apiary.ok_or_else(|| {
            HivekeepError::InvalidTarget("no apiary selected, try `use <name>`".into())
        })
    }

    fn pallet(&self, code: &str) -> Result<PalletId> {
        let apiary = self.current_apiary()?;
        self.engine
            .yard()
            .pallet_by_code(apiary, code)
            .map(|p| p.id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, code))
    }

    fn hive(&self, prefix: &str) -> Result<HiveId> {
        let matches: Vec<HiveId> = self
            .engine
            .yard()
            .hives()
            .iter()
            .filter(|h| h.id.short().starts_with(prefix))
            .map(|h| h.id)
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(HivekeepError::not_found(EntityType::Hive, prefix)),
            _ => Err(HivekeepError::InvalidTarget(format!(
                "{} matches several hives",
                prefix
            ))),
        }
    }

    fn nucleus(&self, prefix: &str) -> Result<NucleusId> {
        self.engine
            .yard()
            .nuclei()
            .iter()
            .find(|n| n.id.short().starts_with(prefix))
            .map(|n| n.id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Nucleus, prefix))
    }

    fn run(&mut self, command: &str, args: &[&str]) -> Result<()> {
        match (command, args) {
            ("help" | "h", _) => print_help(),
            ("apiaries", _) => self.list_apiaries()?,
            ("apiary", words) if !words.is_empty() => {
                let id = self.engine.create_apiary(NewApiary::named(words.join(" ")))?;
                self.apiary = Some(id);
                println!("Apiary created and selected");
            }
            ("use", words) if !words.is_empty() => self.select(&words.join(" "))?,
            ("pallets", _) => self.list_pallets()?,
            ("pallet", []) => self.create_pallet(None)?,
            ("pallet", [capacity]) => {
                self.create_pallet(Some(parse_number(capacity, "capacity")?))?
            }
            ("show", [code]) => self.show_pallet(code)?,
            ("add", [code]) => self.add_hive(code, 1)?,
            ("add", [code, chambers]) => {
                self.add_hive(code, parse_number(chambers, "chambers")?)?
            }
            ("move", [hive, code]) => self.move_hive(hive, code, None)?,
            ("move", [hive, code, position]) => {
                self.move_hive(hive, code, Some(parse_number(position, "position")?))?
            }
            ("remove", [hive]) => {
                let id = self.hive(hive)?;
                self.engine.remove_hive(id)?;
                println!("Hive {} removed", id.short());
            }
            ("nuclei", _) => self.list_nuclei()?,
            ("nucleus", []) => {
                let apiary = self.current_apiary()?;
                let id = self.engine.add_nucleus(apiary, NucleusSpec::default())?;
                println!("Nucleus {} added", id.short());
            }
            ("promote", [nucleus, code]) => self.promote(nucleus, code, 1)?,
            ("promote", [nucleus, code, chambers]) => {
                self.promote(nucleus, code, parse_number(chambers, "chambers")?)?
            }
            ("varroa", [hive, mites, bees]) => {
                let apiary = self.current_apiary()?;
                let hive = self.hive(hive)?;
                let reading = self.engine.record_varroa_check(
                    apiary,
                    hive,
                    parse_number(mites, "mites")?,
                    parse_number(bees, "bees")?,
                )?;
                println!("Infestation {:.2}% ({} risk)", reading.rate, reading.risk);
            }
            ("users", _) => {
                for user in self.engine.yard().users() {
                    println!(
                        "  {:<12} {:<10} {:<9} {}",
                        user.username,
                        user.role.to_string(),
                        user.status.to_string(),
                        user.name
                    );
                }
            }
            ("user", [username, role, name @ ..]) if !name.is_empty() => {
                let role: Role = role.parse().map_err(HivekeepError::InvalidAttribute)?;
                self.engine
                    .create_user(NewUser::new(*username, name.join(" "), role))?;
                println!("User {} created", username);
            }
            ("toggle", [username]) => {
                let id = self
                    .engine
                    .yard()
                    .find_user(username)
                    .map(|u| u.id)
                    .ok_or_else(|| HivekeepError::not_found(EntityType::User, username))?;
                let status = self.engine.toggle_user_status(id)?;
                println!("User {} is now {}", username, status);
            }
            ("census", _) => {
                let census = self.engine.hive_census();
                for status in hivekeep::entity::HiveStatus::ALL {
                    println!("  {:<8} {}", status.to_string(), census.count(status));
                }
                println!("  {:<8} {}", "Live", census.live());
            }
            ("audit", []) => self.show_audit(10),
            ("audit", [n]) => self.show_audit(parse_number(n, "count")?),
            ("apiary", _) => return Err(usage("apiary <name>")),
            ("use", _) => return Err(usage("use <name|number>")),
            ("pallet", _) => return Err(usage("pallet [capacity]")),
            ("show", _) => return Err(usage("show <code>")),
            ("add", _) => return Err(usage("add <code> [chambers]")),
            ("move", _) => return Err(usage("move <hive> <code> [position]")),
            ("remove", _) => return Err(usage("remove <hive>")),
            ("nucleus", _) => return Err(usage("nucleus")),
            ("promote", _) => return Err(usage("promote <nucleus> <code> [chambers]")),
            ("audit", _) => return Err(usage("audit [n]")),
            ("varroa", _) => return Err(usage("varroa <hive> <mites> <bees>")),
            ("user", _) => return Err(usage("user <username> <admin|beekeeper> <name>")),
            ("toggle", _) => return Err(usage("toggle <username>")),
            (other, _) => println!("Unknown command '{}', type help", other),
        }
        Ok(())
    }

    fn list_apiaries(&self) -> Result<()> {
        for (i, apiary) in self.engine.yard().apiaries().iter().enumerate() {
            let summary = self.engine.apiary_summary(apiary.id)?;
            println!(
                "  {}. {} [{}] pallets: {}, hives: {}/{}, nuclei: {}",
                i + 1,
                apiary.name,
                apiary.status,
                summary.pallets,
                summary.live_hives,
                summary.slots,
                summary.nuclei
            );
        }
        Ok(())
    }

    fn select(&mut self, name: &str) -> Result<()> {
        let apiaries = self.engine.yard().apiaries();
        let found = match name.parse::<usize>() {
            Ok(n) if n >= 1 => apiaries.get(n - 1),
            _ => apiaries.iter().find(|a| a.name.eq_ignore_ascii_case(name)),
        };
        let apiary = found.ok_or_else(|| HivekeepError::not_found(EntityType::Apiary, name))?;
        self.apiary = Some(apiary.id);
        Ok(())
    }

    fn list_pallets(&self) -> Result<()> {
        let apiary = self.current_apiary()?;
        for pallet in self.engine.yard().pallets_in(apiary) {
            println!(
                "  {} {}/{}",
                pallet.code,
                self.engine.occupancy(pallet.id),
                pallet.capacity
            );
        }
        Ok(())
    }

    fn create_pallet(&mut self, capacity: Option<u32>) -> Result<()> {
        let apiary = self.current_apiary()?;
        let id = self.engine.create_pallet(apiary, capacity)?;
        if let Some(pallet) = self.engine.yard().pallet(id) {
            println!("Pallet {} created ({} slots)", pallet.code, pallet.capacity);
        }
        Ok(())
    }

    fn show_pallet(&self, code: &str) -> Result<()> {
        let pallet = self.pallet(code)?;
        for (position, slot) in self.engine.pallet_slots(pallet)?.iter().enumerate() {
            match slot {
                Some(hive) => println!(
                    "  [{}] {} {} {} chambers, queen {}",
                    position,
                    hive.id.short(),
                    hive.status,
                    hive.chamber_count,
                    hive.queen.status
                ),
                None => println!("  [{}] empty", position),
            }
        }
        Ok(())
    }

    fn add_hive(&mut self, code: &str, chambers: u8) -> Result<()> {
        let pallet = self.pallet(code)?;
        let id = self
            .engine
            .add_hive(pallet, HiveSpec::default().with_chambers(chambers))?;
        println!("Hive {} added", id.short());
        Ok(())
    }

    fn move_hive(&mut self, hive: &str, code: &str, position: Option<Position>) -> Result<()> {
        let hive = self.hive(hive)?;
        let pallet = self.pallet(code)?;
        let request = match position {
            Some(position) => MoveRequest::to_slot(hive, pallet, position),
            None => MoveRequest::to_pallet(hive, pallet),
        };
        match self.engine.move_hive(request)? {
            MoveOutcome::Unchanged => println!("Nothing to move"),
            _ => {
                if let Some(entry) = self.engine.audit_log().last() {
                    println!("{}", entry.details);
                }
            }
        }
        Ok(())
    }

    fn list_nuclei(&self) -> Result<()> {
        let apiary = self.current_apiary()?;
        for nucleus in self.engine.yard().nuclei_in(apiary) {
            println!(
                "  {} {} installed {}",
                nucleus.id.short(),
                nucleus.status,
                nucleus.install_date
            );
        }
        Ok(())
    }

    fn promote(&mut self, nucleus: &str, code: &str, chambers: u8) -> Result<()> {
        let nucleus = self.nucleus(nucleus)?;
        let pallet = self.pallet(code)?;
        let hive = self.engine.promote_nucleus(
            nucleus,
            PromotionTarget {
                pallet_id: pallet,
                chamber_count: chambers,
            },
        )?;
        println!("Nucleus promoted to hive {}", hive.short());
        Ok(())
    }

    fn show_audit(&self, limit: usize) {
        for entry in self.engine.audit_log().recent(limit) {
            println!("  {}", entry);
        }
    }
}

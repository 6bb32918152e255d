//! Textual command surface: parses the `pet` subcommands and renders results.

use crate::core::{PetError, PetKind, PlayerId, Result};
use crate::service::PetService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Spawn { kind: String },
    Despawn,
    List,
    Rename { generated_name: String, new_name: String },
    Release { name: String },
    Revive { name: String },
}

/// Parses a `pet ...` command line (without the leading `pet`). Multi-word
/// names are joined back with single spaces.
pub fn parse(input: &str) -> Result<Command> {
    let args: Vec<&str> = input.split_whitespace().collect();
    let usage = "pet [rename|spawn|despawn|list|release|revive]";
    let Some(sub) = args.first() else {
        return Err(PetError::Usage(usage.to_string()));
    };

    match sub.to_ascii_lowercase().as_str() {
        "spawn" => match args.get(1) {
            Some(kind) => Ok(Command::Spawn {
                kind: kind.to_string(),
            }),
            None => Err(PetError::Usage("pet spawn <kind>".to_string())),
        },
        "despawn" => Ok(Command::Despawn),
        "list" => Ok(Command::List),
        "rename" => {
            if args.len() < 3 {
                return Err(PetError::Usage(
                    "pet rename <generatedname> <newname>".to_string(),
                ));
            }
            Ok(Command::Rename {
                generated_name: args[1].to_string(),
                new_name: args[2..].join(" "),
            })
        }
        "release" => {
            if args.len() < 2 {
                return Err(PetError::Usage("pet release <petname>".to_string()));
            }
            Ok(Command::Release {
                name: args[1..].join(" "),
            })
        }
        "revive" => {
            if args.len() < 2 {
                return Err(PetError::Usage("pet revive <petname>".to_string()));
            }
            Ok(Command::Revive {
                name: args[1..].join(" "),
            })
        }
        _ => Err(PetError::Usage(usage.to_string())),
    }
}

/// Parses and executes one command line for `owner`, returning the text to
/// show them. Rejected operations come back as errors.
pub async fn dispatch(service: &PetService, owner: PlayerId, input: &str) -> Result<String> {
    match parse(input)? {
        Command::Spawn { kind } => {
            let kind: PetKind = kind.parse()?;
            let name = service.spawn(owner, kind).await?;
            Ok(format!("Your pet {} has been spawned!", name))
        }
        Command::Despawn => {
            service.despawn(owner).await;
            Ok("Your pet has been despawned.".to_string())
        }
        Command::List => Ok(render_listing(service, owner).await),
        Command::Rename {
            generated_name,
            new_name,
        } => {
            service.rename(owner, &generated_name, &new_name).await?;
            Ok(format!("Your pet has been renamed to {}!", new_name))
        }
        Command::Release { name } => {
            let released = service.release(owner, &name).await?;
            Ok(format!(
                "You released {}. The pet is gone forever.",
                released
            ))
        }
        Command::Revive { name } => {
            let revived = service.revive(owner, &name).await?;
            Ok(format!("You revived {}!", revived))
        }
    }
}

async fn render_listing(service: &PetService, owner: PlayerId) -> String {
    let listing = service.list(owner).await;
    if listing.alive.is_empty() && listing.dead.is_empty() {
        return "You don't own any pets yet.".to_string();
    }

    let mut lines = vec!["Your Pets:".to_string()];
    for pet in &listing.alive {
        let status = if pet.spawned {
            "[SPAWNED]"
        } else {
            "[Not Spawned]"
        };
        lines.push(format!(
            "  {} {} - {} ({})",
            status, pet.kind, pet.display_name, pet.generated_name
        ));
    }
    if !listing.dead.is_empty() {
        lines.push("Dead Pets (Can be revived):".to_string());
        for pet in &listing.dead {
            let window = match pet.revivable_for_ms {
                Some(ms) => {
                    let hours = ms / 3_600_000;
                    let minutes = (ms % 3_600_000) / 60_000;
                    format!("{}h {}m remaining", hours, minutes)
                }
                None => "Too late to revive".to_string(),
            };
            lines.push(format!(
                "  [DEAD] {} - {} ({})",
                pet.kind, pet.display_name, window
            ));
        }
    }
    lines.join("\n")
}

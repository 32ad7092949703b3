//! Free-text command matching.
//!
//! Input is matched against the union of all registered patterns; when more
//! than one pattern matches, the one with the longest pattern text wins. The
//! length heuristic lets a specific command (`^n$` shorthand) coexist with a
//! general one (`^go (?P<direction>.+)$`) without an explicit priority
//! system. Exact-length ties go to the first-registered pattern.

use std::collections::BTreeMap;

use crate::registry::{CompiledCommand, Registry};

/// Collapses internal whitespace and trims the ends.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches normalized input against every registered pattern and returns the
/// winning command with its named captures, or `None` when nothing matches.
pub fn route<'r>(
    registry: &'r Registry,
    input: &str,
) -> Option<(&'r CompiledCommand, BTreeMap<String, String>)> {
    let mut best: Option<&CompiledCommand> = None;
    for command in registry.commands() {
        if !command.regex.is_match(input) {
            continue;
        }
        // Strictly-greater keeps the first-registered command on ties;
        // commands are iterated in registration (id) order.
        if best.is_none_or(|b| command.pattern.len() > b.pattern.len()) {
            best = Some(command);
        }
    }

    let command = best?;
    let caps = command.regex.captures(input)?;
    let mut captures = BTreeMap::new();
    for name in command.regex.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            captures.insert(name.to_string(), m.as_str().to_string());
        }
    }
    Some((command, captures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityDef, CommandDef};
    use crate::error::Result;
    use crate::event::Event;
    use crate::registry::RegistryBuilder;
    use crate::zone::Zone;

    fn go(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn north(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn first(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn second(_zone: &mut Zone, _event: &mut Event) -> Result<()> {
        Ok(())
    }

    fn revive_nothing(
        _record: serde_json::Value,
    ) -> Result<Box<dyn crate::capability::Capability>> {
        Err(crate::EngineError::UnknownCapability("test".into()))
    }

    fn registry_with(commands: Vec<CommandDef>) -> std::sync::Arc<crate::Registry> {
        let mut builder = RegistryBuilder::default();
        builder.register_def(CapabilityDef {
            name: "Test",
            revive: revive_nothing,
            tick: None,
            commands,
            hooks: Vec::new(),
        });
        builder.build().unwrap()
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  go   north  "), "go north");
    }

    #[test]
    fn longest_pattern_wins_regardless_of_registration_order() {
        for flipped in [false, true] {
            let mut commands = vec![
                CommandDef {
                    name: "go",
                    pattern: r"^go (?P<direction>.+)$",
                    handler: go,
                },
                CommandDef {
                    name: "n",
                    pattern: r"^n$",
                    handler: north,
                },
            ];
            if flipped {
                commands.reverse();
            }
            let registry = registry_with(commands);

            let (command, _) = route(&registry, "n").unwrap();
            assert_eq!(command.name, "n");

            let (command, captures) = route(&registry, "go north").unwrap();
            assert_eq!(command.name, "go");
            assert_eq!(captures.get("direction").unwrap(), "north");
        }
    }

    #[test]
    fn equal_length_ties_go_to_first_registered() {
        let registry = registry_with(vec![
            CommandDef {
                name: "first",
                pattern: r"^hum (?P<a>.+)$",
                handler: first,
            },
            CommandDef {
                name: "second",
                pattern: r"^hum (?P<b>.+)$",
                handler: second,
            },
        ]);
        let (command, _) = route(&registry, "hum tune").unwrap();
        assert_eq!(command.name, "first");
    }

    #[test]
    fn no_match_returns_none() {
        let registry = registry_with(vec![CommandDef {
            name: "n",
            pattern: r"^n$",
            handler: north,
        }]);
        assert!(route(&registry, "dance").is_none());
    }
}

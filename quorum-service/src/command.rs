//! The admin verb surface: discrete commands consumed by an audit actor.
//!
//! Verbs arrive as free text from whatever transport fronts the service;
//! parsing is transport-agnostic and never mutates anything.

use quorum_core::SettableField;

/// Errors produced while parsing admin command text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CommandParseError {
    /// The first word is not a known verb.
    #[error("unknown command '{0}'")]
    UnknownVerb(String),

    /// The verb needs an argument that was not supplied.
    #[error("'{verb}' requires {argument}")]
    MissingArgument {
        verb: &'static str,
        argument: &'static str,
    },

    /// An argument was supplied but could not be parsed.
    #[error("invalid argument '{value}': expected {expected}")]
    InvalidArgument {
        value: String,
        expected: &'static str,
    },

    /// `get`/`set` named a field outside the enumerated safe set.
    #[error("'{0}' is not a settable field")]
    UnknownField(String),
}

/// A parsed admin command.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AdminCommand {
    /// Open registration (derives the inspection reward).
    Open,
    /// Close registration.
    Close,
    /// Start auditing (assignment plus initial drip feed).
    Start,
    /// Stop auditing and run the result pipeline.
    Stop,
    /// Report the current phase.
    State,
    /// Append an item description.
    AddItem(String),
    /// Delete an item by index.
    DeleteItem(usize),
    /// List items with their indices.
    ListItems,
    /// List inspections without a finding yet.
    Outstanding,
    /// Read one of the enumerated safe fields.
    Get(SettableField),
    /// Override one of the enumerated safe fields.
    Set(SettableField, String),
    /// Serialized snapshot of the whole audit.
    Dump,
    /// The command listing.
    Help,
}

impl AdminCommand {
    /// Parses one line of admin input.
    ///
    /// # Errors
    /// Returns a [`CommandParseError`] describing what was wrong; callers
    /// typically answer with [`help_text`].
    pub fn parse(input: &str) -> Result<Self, CommandParseError> {
        let trimmed = input.trim();
        let mut words = trimmed.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let rest = trimmed.strip_prefix(verb).unwrap_or_default().trim();

        match verb {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "state" => Ok(Self::State),
            "items" => Ok(Self::ListItems),
            "outstanding" => Ok(Self::Outstanding),
            "dump" => Ok(Self::Dump),
            "help" => Ok(Self::Help),
            "add" => {
                if rest.is_empty() {
                    Err(CommandParseError::MissingArgument {
                        verb: "add",
                        argument: "an item description",
                    })
                } else {
                    Ok(Self::AddItem(rest.to_owned()))
                }
            }
            "del" => {
                let value = words.next().ok_or(CommandParseError::MissingArgument {
                    verb: "del",
                    argument: "an item index",
                })?;
                let index = value.parse().map_err(|_| CommandParseError::InvalidArgument {
                    value: value.to_owned(),
                    expected: "an item index",
                })?;
                Ok(Self::DeleteItem(index))
            }
            "get" => {
                let name = words.next().ok_or(CommandParseError::MissingArgument {
                    verb: "get",
                    argument: "a field name",
                })?;
                let field = name
                    .parse()
                    .map_err(|_| CommandParseError::UnknownField(name.to_owned()))?;
                Ok(Self::Get(field))
            }
            "set" => {
                let name = words.next().ok_or(CommandParseError::MissingArgument {
                    verb: "set",
                    argument: "a field name and value",
                })?;
                let field: SettableField = name
                    .parse()
                    .map_err(|_| CommandParseError::UnknownField(name.to_owned()))?;
                let value: String = words.collect::<Vec<_>>().join(" ");
                if value.is_empty() {
                    return Err(CommandParseError::MissingArgument {
                        verb: "set",
                        argument: "a value",
                    });
                }
                Ok(Self::Set(field, value))
            }
            other => Err(CommandParseError::UnknownVerb(other.to_owned())),
        }
    }
}

/// The admin command listing, answered on `help` or any unparseable input.
#[must_use]
pub fn help_text() -> String {
    [
        "Commands:",
        "=======================",
        "open : allows auditors to register",
        "close : closes registration",
        "start : starts the audit",
        "stop : stops the audit and computes results",
        "state : returns the current phase of the audit",
        "add <description> : adds an item to the audit",
        "del <index> : deletes an item (index from `items`)",
        "items : lists the items in the audit",
        "outstanding : lists inspections without a finding yet",
        "get <field> : reads audits_per_item, slashing_ratio, or bond",
        "set <field> <value> : overrides one of those fields before `open`",
        "dump : serialized snapshot of the audit",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_verbs_parse() {
        assert_eq!(AdminCommand::parse("open").ok(), Some(AdminCommand::Open));
        assert_eq!(AdminCommand::parse("  stop  ").ok(), Some(AdminCommand::Stop));
        assert_eq!(AdminCommand::parse("state").ok(), Some(AdminCommand::State));
        assert_eq!(AdminCommand::parse("outstanding").ok(), Some(AdminCommand::Outstanding));
    }

    #[test]
    fn add_keeps_the_whole_description() {
        let parsed = AdminCommand::parse("add door seals intact on unit 7");
        assert_eq!(
            parsed.ok(),
            Some(AdminCommand::AddItem("door seals intact on unit 7".to_owned()))
        );
    }

    #[test]
    fn add_without_description_is_rejected() {
        assert!(matches!(
            AdminCommand::parse("add"),
            Err(CommandParseError::MissingArgument { verb: "add", .. })
        ));
    }

    #[test]
    fn del_parses_an_index() {
        assert_eq!(AdminCommand::parse("del 3").ok(), Some(AdminCommand::DeleteItem(3)));
        assert!(matches!(
            AdminCommand::parse("del three"),
            Err(CommandParseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn set_joins_multi_word_values() {
        let parsed = AdminCommand::parse("set slashing_ratio 1.5");
        assert_eq!(
            parsed.ok(),
            Some(AdminCommand::Set(SettableField::SlashingRatio, "1.5".to_owned()))
        );
    }

    #[test]
    fn set_rejects_fields_outside_the_safe_set() {
        assert!(matches!(
            AdminCommand::parse("set inspections []"),
            Err(CommandParseError::UnknownField(_))
        ));
        assert!(matches!(
            AdminCommand::parse("get phase"),
            Err(CommandParseError::UnknownField(_))
        ));
    }

    #[test]
    fn unknown_verb_is_reported_verbatim() {
        assert!(matches!(
            AdminCommand::parse("launch"),
            Err(CommandParseError::UnknownVerb(ref v)) if v == "launch"
        ));
    }
}

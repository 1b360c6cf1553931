//! Command resolution.
//!
//! Player text is tokenized with the ignore sets of the whole current
//! chain, then matched longest-prefix first: the joined tokens are looked
//! up in the current location's action table and then in each ancestor's;
//! if nothing matches, the last token moves to the argument list and the
//! shorter command is tried. Exact-only actions match only the untrimmed
//! input.

use std::collections::VecDeque;
use std::io::{BufRead, Seek};
use std::rc::Rc;

use cranea_core::{command_key, hash_key, join, tokenize, Gid, Hook, Key};
use cranea_seal::ActionRecord;
use tracing::trace;

use crate::error::Result;
use crate::navigator::{Location, Navigator};

/// A matched action.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Location whose table matched; paths in the action are relative to it.
    pub owner: Gid,
    pub action: Gid,
    pub record: Rc<ActionRecord>,
    /// The normalized command that matched.
    pub command: String,
    /// Trailing tokens, in input order.
    pub args: Vec<String>,
}

impl<R: BufRead + Seek> Navigator<R> {
    /// Resolve player input against the current location and its ancestors.
    pub fn resolve(&mut self, input: &str) -> Result<Option<Resolution>> {
        let chain = self.chain()?;
        let mut tokens = tokenize(input, |t| chain.iter().any(|l| l.ignores(t)));
        let mut args = VecDeque::new();

        while !tokens.is_empty() {
            let command = join(&tokens);
            let first = args.is_empty();
            if let Some((owner, action, record)) = self.lookup(&chain, &command_key(&command), first)? {
                trace!(%command, %action, "resolved");
                return Ok(Some(Resolution {
                    owner,
                    action,
                    record,
                    command,
                    args: args.into(),
                }));
            }
            if let Some(last) = tokens.pop() {
                args.push_front(last);
            }
        }

        trace!(input, "unrecognized");
        Ok(None)
    }

    /// Resolve a synthetic entry hook.
    pub fn resolve_hook(&mut self, hook: Hook) -> Result<Option<Resolution>> {
        let chain = self.chain()?;
        Ok(self
            .lookup(&chain, &hook.key(), true)?
            .map(|(owner, action, record)| Resolution {
                owner,
                action,
                record,
                command: hook.command().to_string(),
                args: Vec::new(),
            }))
    }

    fn lookup(
        &mut self,
        chain: &[Rc<Location>],
        command: &Key,
        first: bool,
    ) -> Result<Option<(Gid, Gid, Rc<ActionRecord>)>> {
        let hash = hash_key(command);
        for location in chain {
            for slot in location.slots(&hash) {
                let Some(target) = slot.open(command) else {
                    trace!(location = %location.gid, "slot does not open");
                    continue;
                };
                if target.exact && !first {
                    continue;
                }
                if let Some(record) = self.action(&target)? {
                    return Ok(Some((location.gid, target.gid, record)));
                }
            }
        }
        Ok(None)
    }
}

//! Binding engine.
//!
//! Walks a [`ParseTree`] block by block and writes converted values into
//! caller-owned structures described by [`FieldDescriptor`] lists.
//!
//! Binding one block runs three phases:
//!
//! 1. every field gets its default ([`default_init`]),
//! 2. every field is matched against the block's children by name and each
//!    match is converted into the destination,
//! 3. children no field claimed are reported as unknown parameters, unless
//!    the block is relaxed.
//!
//! Nested blocks go through [`BlockOps`] so their storage can be rolled back
//! when their contents turn out to be unusable. Problems never stop a pass;
//! they are recorded in [`ConfigErrors`] and the pass moves on to the next
//! field or block.
//!
//! ```
//! use stanza::binding::load_config_from_parse;
//! use stanza::builder::parse_str;
//! use stanza::diagnostics::ConfigErrors;
//! use stanza::schema::{BlockDescriptor, EmbeddedBlock, FieldDescriptor};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Core {
//!     port: u32,
//! }
//!
//! let desc = BlockDescriptor::new(
//!     "Core",
//!     vec![FieldDescriptor::uint32("Port", 1, 65535, 2049, |c: &mut Core| &mut c.port)],
//!     EmbeddedBlock::new(),
//! );
//! let tree = parse_str("demo.conf", "Core { Port = 12049; }").unwrap();
//! let mut core = Core::default();
//! let mut errs = ConfigErrors::new();
//! assert_eq!(load_config_from_parse(&tree, &desc, &mut core, false, &mut errs).unwrap(), 1);
//! assert_eq!(core.port, 12049);
//! ```

mod convert;
#[cfg(test)]
mod proptests;

use crate::diagnostics::{ConfigErrors, ErrorKind, ErrorKinds};
use crate::error::{Error, Result};
use crate::schema::{
    BlockDescriptor, BlockOps, CommitOutcome, FieldDescriptor, FieldFlags, FieldKind, IntField,
    Integer, NetworkPort, ProcHandler, TokenField,
};
use crate::tree::{NodeId, NodeRef, ParseTree};
use std::collections::HashSet;

/// State carried through one binding pass.
///
/// Holds the error accumulator and the set of children already claimed by a
/// field of the block being processed. The set only lives as long as the
/// pass, so the tree itself is never written to.
#[derive(Debug)]
pub struct Pass<'e> {
    errs: &'e mut ConfigErrors,
    seen: HashSet<NodeId>,
}

impl<'e> Pass<'e> {
    /// Start a pass that records into `errs`.
    pub fn new(errs: &'e mut ConfigErrors) -> Self {
        Self {
            errs,
            seen: HashSet::new(),
        }
    }

    /// The accumulator this pass records into.
    pub fn errors(&mut self) -> &mut ConfigErrors {
        self.errs
    }
}

/// Write every field's default value into `dest`.
///
/// Nested block fields prepare their link through
/// [`BlockOps::init_link`]. Running this twice on fresh destinations gives
/// identical results.
pub fn default_init<T>(fields: &[FieldDescriptor<T>], dest: &mut T) {
    for (idx, field) in fields.iter().enumerate() {
        if declared_earlier(fields, idx) {
            continue;
        }
        match &field.kind {
            FieldKind::Noop | FieldKind::Deprecated(_) => {}
            FieldKind::Int16(f) => int_default(f, dest),
            FieldKind::UInt16(f) => int_default(f, dest),
            FieldKind::Int32(f) => int_default(f, dest),
            FieldKind::UInt32(f) => int_default(f, dest),
            FieldKind::Int64(f) => int_default(f, dest),
            FieldKind::UInt64(f) => int_default(f, dest),
            FieldKind::Fsid { default, access } => *access(dest) = *default,
            FieldKind::String(f) | FieldKind::Path(f) => {
                *(f.access)(dest) = f.default.map(String::from);
            }
            FieldKind::Token(f) => *(f.access)(dest) = f.default,
            FieldKind::Enum(f) | FieldKind::List(f) => *(f.access)(dest) |= f.default,
            FieldKind::Bool { default, access } => *access(dest) = *default,
            FieldKind::BoolBit {
                default,
                bit,
                access,
            } => set_bit(access(dest), *bit, *default),
            FieldKind::IpAddr { default, access } => *access(dest) = *default,
            FieldKind::InetPort {
                default, access, ..
            } => *access(dest) = NetworkPort::from_host(*default),
            FieldKind::Block(nested) => nested.init_default(dest),
            FieldKind::Proc(p) => {
                if let Some(init) = p.init {
                    init(dest);
                }
            }
        }
    }
}

fn declared_earlier<T>(fields: &[FieldDescriptor<T>], idx: usize) -> bool {
    fields[..idx]
        .iter()
        .any(|f| f.name.eq_ignore_ascii_case(fields[idx].name))
}

fn int_default<T, V: Integer>(field: &IntField<T, V>, dest: &mut T) {
    *(field.access)(dest) = field.default;
}

fn set_bit(word: &mut u32, bit: u32, on: bool) {
    if on {
        *word |= bit;
    } else {
        *word &= !bit;
    }
}

/// Match and convert the children of `blk` into `dest`, then report the
/// children no field claimed. Returns the number of errors recorded.
fn load_block<T>(
    blk: NodeRef<'_>,
    fields: &[FieldDescriptor<T>],
    relax: bool,
    dest: &mut T,
    pass: &mut Pass<'_>,
) -> usize {
    let cp = pass.errs.checkpoint();

    for (idx, field) in fields.iter().enumerate() {
        if declared_earlier(fields, idx) {
            pass.errs.record(
                ErrorKind::Internal,
                Some(blk),
                format!(
                    "Parameter {} declared more than once for block ({})",
                    field.name,
                    blk.name()
                ),
            );
            continue;
        }

        let matches: Vec<NodeRef<'_>> = blk.children().filter(|c| c.is_named(field.name)).collect();
        pass.seen.extend(matches.iter().map(NodeRef::id));

        if matches.is_empty() {
            if field.flags.contains(FieldFlags::MANDATORY) {
                pass.errs.record(
                    ErrorKind::Missing,
                    Some(blk),
                    format!(
                        "Mandatory field, {} is missing from block ({})",
                        field.name,
                        blk.name()
                    ),
                );
            }
            continue;
        }

        for (n, node) in matches.into_iter().enumerate() {
            if n > 0 && field.flags.contains(FieldFlags::UNIQUE) {
                pass.errs.record(
                    ErrorKind::Unique,
                    Some(node),
                    format!("Parameter {} set more than once", node.name()),
                );
                continue;
            }
            log::trace!(
                "{}: {} {} at line {}",
                blk.name(),
                field.kind.type_name(),
                field.name,
                node.line()
            );
            apply_node(field, node, dest, pass);
        }
    }

    if !relax {
        for child in blk.children() {
            if !pass.seen.contains(&child.id()) {
                pass.errs.record(
                    ErrorKind::Bogus,
                    Some(child),
                    format!("Unknown parameter ({})", child.name()),
                );
            }
        }
    }
    for child in blk.children() {
        pass.seen.remove(&child.id());
    }

    pass.errs.errors_since(cp)
}

/// Apply one matched child to `dest`.
fn apply_node<T>(field: &FieldDescriptor<T>, node: NodeRef<'_>, dest: &mut T, pass: &mut Pass<'_>) {
    let empty = if node.is_block() {
        node.child_count() == 0
    } else {
        node.terms().is_empty()
    };
    if empty {
        log::info!(
            "{} {} is empty",
            if node.is_block() { "Block" } else { "Statement" },
            node.name()
        );
        return;
    }

    if let FieldKind::Block(nested) = &field.kind {
        if !node.is_block() {
            pass.errs.record(
                ErrorKind::Invalid,
                Some(node),
                format!("{} is not a block!", node.name()),
            );
            return;
        }
        let relax = field.flags.contains(FieldFlags::RELAX);
        if !nested.load(node, dest, relax, pass) {
            pass.errs
                .note(Some(node), format!("Errors processing block ({})", node.name()));
        }
        return;
    }

    if node.is_block() {
        pass.errs.record(
            ErrorKind::Invalid,
            Some(node),
            format!("{} is a block, expected a {} value", node.name(), field.kind.type_name()),
        );
        return;
    }

    let terms = node.terms();
    let multi_ok = matches!(field.kind, FieldKind::List(_) | FieldKind::Proc(_));
    if terms.len() > 1 && !multi_ok {
        pass.errs.record(
            ErrorKind::Invalid,
            Some(node),
            format!(
                "{} can have only one option.  First one is ({})",
                node.name(),
                terms[0]
            ),
        );
        return;
    }

    let term = &terms[0];
    let errs = &mut *pass.errs;
    let set = match &field.kind {
        FieldKind::Noop => false,
        FieldKind::Int16(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::UInt16(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::Int32(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::UInt32(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::Int64(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::UInt64(f) => store(convert::number(f, node, term, errs), (f.access)(dest)),
        FieldKind::Fsid { access, .. } => store(convert::fsid(node, term, errs), access(dest)),
        FieldKind::String(f) | FieldKind::Path(f) => store(
            convert::string(f, field.name, node, term, errs).map(Some),
            (f.access)(dest),
        ),
        FieldKind::Token(f) => store(convert::token(f.table, node, term, errs), (f.access)(dest)),
        FieldKind::Enum(f) => {
            let value = convert::token(f.table, node, term, errs);
            merge_masked(f, value, dest)
        }
        FieldKind::List(f) => {
            let value = convert::list(f.table, node, errs);
            merge_masked(f, value, dest)
        }
        FieldKind::Bool { access, .. } => store(convert::boolean(node, term, errs), access(dest)),
        FieldKind::BoolBit { bit, access, .. } => match convert::boolean(node, term, errs) {
            Some(on) => {
                set_bit(access(dest), *bit, on);
                true
            }
            None => false,
        },
        FieldKind::IpAddr { access, .. } => store(convert::ip_addr(node, term, errs), access(dest)),
        FieldKind::InetPort {
            min, max, access, ..
        } => store(
            convert::port(*min, *max, node, term, errs).map(NetworkPort::from_host),
            access(dest),
        ),
        FieldKind::Proc(p) => run_proc(field.name, p.handler, node, dest, errs),
        FieldKind::Deprecated(message) => {
            errs.record(
                ErrorKind::Deprecated,
                Some(node),
                match message {
                    Some(msg) => format!("Deprecated parameter ({}) - {msg}", field.name),
                    None => format!("Deprecated parameter ({})", field.name),
                },
            );
            false
        }
        FieldKind::Block(_) => false,
    };

    if set && field.flags.contains(FieldFlags::MARK_SET) {
        if let Some(mark) = &field.mark {
            *(mark.mask)(dest) |= mark.bit;
        }
    }
}

fn store<V>(value: Option<V>, slot: &mut V) -> bool {
    match value {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

/// Enum and list values own the `mask` bits of their word. Bits still at
/// the default are cleared so the file's value replaces the default rather
/// than being merged with it.
fn merge_masked<T>(field: &TokenField<T>, value: Option<u32>, dest: &mut T) -> bool {
    let Some(bits) = value else {
        return false;
    };
    let word = (field.access)(dest);
    if *word & field.mask == field.default {
        *word &= !field.mask;
    }
    *word |= bits;
    true
}

/// Hand every term of `node` to a custom handler. Errors the handler reports
/// without recording them are filled in so the count and the diagnostic
/// stream agree.
fn run_proc<T>(
    name: &str,
    handler: ProcHandler<T>,
    node: NodeRef<'_>,
    dest: &mut T,
    errs: &mut ConfigErrors,
) -> bool {
    let cp = errs.checkpoint();
    let mut reported = 0;
    for term in node.terms() {
        reported += handler(dest, term, node, errs);
    }
    let recorded = errs.errors_since(cp);
    for _ in recorded..reported {
        errs.record(
            ErrorKind::Invalid,
            Some(node),
            format!("{name}: handler rejected the value"),
        );
    }
    reported == 0 && recorded == 0
}

/// Run the full nested block protocol for one block instance.
///
/// Returns true when the item was committed (or disposed of on request);
/// false when it was released because of errors.
pub(crate) fn proc_block<O: BlockOps>(
    node: NodeRef<'_>,
    desc: &BlockDescriptor<O>,
    relax: bool,
    link: &mut O::Link,
    pass: &mut Pass<'_>,
) -> bool {
    if !node.is_block() {
        pass.errs.record(
            ErrorKind::Invalid,
            Some(node),
            format!("{} is not a block!", node.name()),
        );
        return false;
    }

    let cp = pass.errs.checkpoint();
    let Some(mut item) = desc.ops.acquire(link) else {
        pass.errs.record(
            ErrorKind::Init,
            Some(node),
            format!("Could not init block for {}", desc.name),
        );
        return false;
    };

    log::debug!("{}: default init for {}", node.location(), desc.name);
    default_init(&desc.fields, &mut item);

    log::debug!("{}: load {}", node.location(), desc.name);
    let relax = relax || desc.flags.contains(FieldFlags::RELAX);
    let errors = load_block(node, &desc.fields, relax, &mut item, pass);
    if errors > 0 && !pass.errs.kinds_since(cp).is_harmless() {
        pass.errs.note(
            Some(node),
            format!("{errors} errors while processing parameters for {}", desc.name),
        );
        log::debug!("releasing {} after load errors", desc.name);
        desc.ops.release(link, item);
        return false;
    }

    if let Err(reason) = desc.ops.check(&item) {
        pass.errs.record(
            ErrorKind::Validate,
            Some(node),
            format!("Validation of block {} failed: {reason}", desc.name),
        );
        desc.ops.release(link, item);
        return false;
    }

    log::debug!("{}: commit {}", node.location(), desc.name);
    let commit_cp = pass.errs.checkpoint();
    match desc.ops.commit(node, link, item, pass.errs) {
        CommitOutcome::Attached => true,
        CommitOutcome::Dispose(item) => {
            log::debug!("disposing of {}", desc.name);
            pass.errs.set_dispose(true);
            desc.ops.release(link, item);
            pass.errs.set_dispose(false);
            true
        }
        CommitOutcome::Rejected(item) => {
            if !pass.errs.kinds_since(commit_cp).contains(ErrorKinds::VALIDATE) {
                pass.errs.record(
                    ErrorKind::Validate,
                    Some(node),
                    format!("Validation errors in block {}", desc.name),
                );
            }
            desc.ops.release(link, item);
            false
        }
    }
}

/// Bind one known block node.
///
/// # Errors
///
/// [`Error::BlockMismatch`] if `node` is not a block named after `desc`;
/// [`Error::Load`] if the block was rolled back. Details are in `errs`.
pub fn load_config_from_node<O: BlockOps>(
    node: NodeRef<'_>,
    desc: &BlockDescriptor<O>,
    link: &mut O::Link,
    errs: &mut ConfigErrors,
) -> Result<()> {
    if !node.is_block() || !node.is_named(desc.name) {
        let found = if node.is_block() {
            node.name().to_string()
        } else {
            node.kind().to_string()
        };
        errs.record(
            ErrorKind::Invalid,
            Some(node),
            format!("Looking for block ({}), got ({found})", desc.name),
        );
        return Err(Error::BlockMismatch {
            expected: desc.name.to_string(),
            found,
        });
    }

    let cp = errs.checkpoint();
    let ok = proc_block(node, desc, false, link, &mut Pass::new(errs));
    if ok {
        return Ok(());
    }

    let errors = errs.errors_since(cp);
    let summary = errs.kinds_since(cp).summary();
    errs.note(
        Some(node),
        format!("{errors} errors found in configuration block {}", desc.name),
    );
    Err(Error::Load {
        block: desc.name.to_string(),
        errors,
        summary,
    })
}

/// Bind every top-level block of `tree` named after `desc`.
///
/// The link is default-initialized first, so it holds usable defaults even
/// when the file has no such block. With `unique` (or
/// [`FieldFlags::UNIQUE`] on the descriptor) only the first block is bound
/// and each later one is reported as [`ErrorKind::Exists`].
///
/// Returns the number of blocks bound.
///
/// # Errors
///
/// [`Error::Load`] if anything critical was recorded during this call.
pub fn load_config_from_parse<O: BlockOps>(
    tree: &ParseTree,
    desc: &BlockDescriptor<O>,
    link: &mut O::Link,
    unique: bool,
    errs: &mut ConfigErrors,
) -> Result<usize> {
    let cp = errs.checkpoint();
    let unique = unique || desc.flags.contains(FieldFlags::UNIQUE);
    desc.ops
        .init_link(link, &|item| default_init(&desc.fields, item));

    let mut attempted = 0;
    let mut bound = 0;
    {
        let mut pass = Pass::new(errs);
        for node in tree
            .root()
            .children()
            .filter(|n| n.is_block() && n.is_named(desc.name))
        {
            if unique && attempted > 0 {
                pass.errs.record(
                    ErrorKind::Exists,
                    Some(node),
                    format!("Only one {} block allowed", desc.name),
                );
                continue;
            }
            attempted += 1;
            if proc_block(node, desc, false, link, &mut pass) {
                bound += 1;
            }
        }
    }
    if attempted == 0 {
        log::debug!("no {} block found, using defaults", desc.name);
    }

    let errors = errs.errors_since(cp);
    if errors == 0 {
        return Ok(bound);
    }
    let kinds = errs.kinds_since(cp);
    errs.note(
        None,
        format!("{errors} {} errors found block {}", kinds.summary(), desc.name),
    );
    if kinds.is_critical() {
        return Err(Error::Load {
            block: desc.name.to_string(),
            errors,
            summary: kinds.summary(),
        });
    }
    Ok(bound)
}

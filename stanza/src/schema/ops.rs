//! Nested block lifecycle.
//!
//! A block field owns a [`BlockDescriptor`]: the block's name, flags and
//! field list, plus a [`BlockOps`] value that manages the storage the block
//! is loaded into. Loading one block instance follows a fixed protocol:
//!
//! 1. [`BlockOps::acquire`] hands out fresh working storage (the item).
//! 2. Field defaults are written into the item.
//! 3. The block's statements are converted into the item.
//! 4. [`BlockOps::check`] validates the finished item.
//! 5. [`BlockOps::commit`] attaches it to the parent's link storage.
//!
//! If step 3 records anything worse than harmless diagnostics, or step 4 or 5
//! refuses the item, [`BlockOps::release`] is called exactly once with the
//! item and the block counts as failed.

use super::{Accessor, FieldDescriptor, FieldFlags};
use crate::binding::{self, Pass};
use crate::diagnostics::ConfigErrors;
use crate::tree::NodeRef;
use std::fmt;
use std::marker::PhantomData;

/// Result of [`BlockOps::commit`].
#[derive(Debug)]
pub enum CommitOutcome<U> {
    /// The item now lives in the link storage.
    Attached,
    /// The block was processed but its item must be released.
    Dispose(U),
    /// Validation failed; the item is handed back for release.
    Rejected(U),
}

/// Storage management for one kind of nested block.
pub trait BlockOps: Send + Sync {
    /// Storage in the parent that items are attached to.
    type Link;
    /// Working storage filled from one block instance.
    type Item;

    /// Prepare the link during the parent's default initialization.
    /// `defaults` writes the block's field defaults into an item.
    fn init_link(&self, _link: &mut Self::Link, _defaults: &dyn Fn(&mut Self::Item)) {}

    /// Obtain working storage; `None` means none is available.
    fn acquire(&self, link: &mut Self::Link) -> Option<Self::Item>;

    /// Validate a fully loaded item before it is committed.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem; the item is then released.
    fn check(&self, _item: &Self::Item) -> Result<(), String> {
        Ok(())
    }

    /// Attach `item` to `link`.
    fn commit(
        &self,
        node: NodeRef<'_>,
        link: &mut Self::Link,
        item: Self::Item,
        errs: &mut ConfigErrors,
    ) -> CommitOutcome<Self::Item>;

    /// Undo whatever [`acquire`](Self::acquire) did for `item`.
    fn release(&self, link: &mut Self::Link, item: Self::Item);
}

/// Extra validation applied by the stock block kinds.
pub type Validator<U> = fn(&U) -> Result<(), String>;

/// A block that fills a struct held directly in the parent.
///
/// Each instance is loaded into a copy of the parent's struct, so fields the
/// schema does not describe keep their values. A block instance that fails to
/// load leaves the parent's copy untouched.
pub struct EmbeddedBlock<U> {
    validator: Option<Validator<U>>,
    _item: PhantomData<fn() -> U>,
}

impl<U> EmbeddedBlock<U> {
    /// Embedded block without extra validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: None,
            _item: PhantomData,
        }
    }

    /// Embedded block whose items must pass `validator`.
    #[must_use]
    pub fn validated(validator: Validator<U>) -> Self {
        Self {
            validator: Some(validator),
            _item: PhantomData,
        }
    }
}

impl<U> Default for EmbeddedBlock<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for EmbeddedBlock<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedBlock")
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl<U: Clone> BlockOps for EmbeddedBlock<U> {
    type Link = U;
    type Item = U;

    fn init_link(&self, link: &mut U, defaults: &dyn Fn(&mut U)) {
        defaults(link);
    }

    fn acquire(&self, link: &mut U) -> Option<U> {
        Some(link.clone())
    }

    fn check(&self, item: &U) -> Result<(), String> {
        self.validator.map_or(Ok(()), |v| v(item))
    }

    fn commit(
        &self,
        _node: NodeRef<'_>,
        link: &mut U,
        item: U,
        _errs: &mut ConfigErrors,
    ) -> CommitOutcome<U> {
        *link = item;
        CommitOutcome::Attached
    }

    fn release(&self, _link: &mut U, item: U) {
        drop(item);
    }
}

/// A block that may repeat; each instance is appended to a `Vec` in the
/// parent.
pub struct ListBlock<U> {
    validator: Option<Validator<U>>,
    _item: PhantomData<fn() -> U>,
}

impl<U> ListBlock<U> {
    /// List block without extra validation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: None,
            _item: PhantomData,
        }
    }

    /// List block whose items must pass `validator`.
    #[must_use]
    pub fn validated(validator: Validator<U>) -> Self {
        Self {
            validator: Some(validator),
            _item: PhantomData,
        }
    }
}

impl<U> Default for ListBlock<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> fmt::Debug for ListBlock<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBlock")
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl<U: Default> BlockOps for ListBlock<U> {
    type Link = Vec<U>;
    type Item = U;

    fn acquire(&self, _link: &mut Vec<U>) -> Option<U> {
        Some(U::default())
    }

    fn check(&self, item: &U) -> Result<(), String> {
        self.validator.map_or(Ok(()), |v| v(item))
    }

    fn commit(
        &self,
        _node: NodeRef<'_>,
        link: &mut Vec<U>,
        item: U,
        _errs: &mut ConfigErrors,
    ) -> CommitOutcome<U> {
        link.push(item);
        CommitOutcome::Attached
    }

    fn release(&self, _link: &mut Vec<U>, item: U) {
        drop(item);
    }
}

/// Name, flags, fields and storage operations of one block type.
pub struct BlockDescriptor<O: BlockOps> {
    /// Block name, matched case-insensitively.
    pub name: &'static str,
    /// [`FieldFlags::UNIQUE`] allows one top-level instance;
    /// [`FieldFlags::RELAX`] tolerates unknown parameters.
    pub flags: FieldFlags,
    /// Fields of the block, processed in order.
    pub fields: Vec<FieldDescriptor<O::Item>>,
    /// Storage operations.
    pub ops: O,
}

impl<O: BlockOps> BlockDescriptor<O> {
    /// Descriptor with no flags.
    #[must_use]
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor<O::Item>>, ops: O) -> Self {
        Self {
            name,
            flags: FieldFlags::empty(),
            fields,
            ops,
        }
    }

    /// Add `flags`.
    #[must_use]
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }
}

impl<O: BlockOps> fmt::Debug for BlockDescriptor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Type-erased nested block as seen from the parent type `T`.
pub trait NestedBlock<T>: Send + Sync {
    /// Block name.
    fn name(&self) -> &'static str;

    /// Run the parent's default initialization for this block's link.
    fn init_default(&self, parent: &mut T);

    /// Load one block instance into the parent. Returns false if the block
    /// failed and was rolled back.
    fn load(&self, node: NodeRef<'_>, parent: &mut T, relax: bool, pass: &mut Pass<'_>) -> bool;
}

/// A [`BlockDescriptor`] together with the accessor for its link inside
/// the parent type `T`.
pub struct BlockField<T, O: BlockOps> {
    block: BlockDescriptor<O>,
    link: Accessor<T, O::Link>,
}

impl<T, O: BlockOps> BlockField<T, O> {
    /// Pair `block` with the parent field it is stored in.
    #[must_use]
    pub fn new(block: BlockDescriptor<O>, link: Accessor<T, O::Link>) -> Self {
        Self { block, link }
    }

    /// The nested block's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &BlockDescriptor<O> {
        &self.block
    }
}

impl<T, O: BlockOps> NestedBlock<T> for BlockField<T, O> {
    fn name(&self) -> &'static str {
        self.block.name
    }

    fn init_default(&self, parent: &mut T) {
        let fields = &self.block.fields;
        self.block
            .ops
            .init_link((self.link)(parent), &|item| binding::default_init(fields, item));
    }

    fn load(&self, node: NodeRef<'_>, parent: &mut T, relax: bool, pass: &mut Pass<'_>) -> bool {
        binding::proc_block(node, &self.block, relax, (self.link)(parent), pass)
    }
}

//! Common test utilities for integration tests.
//!
//! This module provides a temporary configuration directory and a small
//! server-style schema (core parameters, exports with client lists, logging)
//! used across the integration suites.

use std::fs;
use std::path::{Path, PathBuf};

use stanza::schema::{BlockDescriptor, EmbeddedBlock, FieldDescriptor, ListBlock, NetworkPort};
use tempfile::TempDir;

/// A temporary directory holding configuration files.
///
/// The directory is removed when the value is dropped.
pub struct ConfigDir {
    dir: TempDir,
}

#[allow(dead_code)]
impl ConfigDir {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `content` to `name` (creating parent directories) and returns
    /// the full path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

/// `NFS_Core_Param` block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoreParams {
    pub nfs_port: NetworkPort,
    pub protocols: u32,
    pub nb_worker: u32,
    pub enable_udp: bool,
}

pub const PROTOCOLS: &[(&str, u32)] = &[("3", 0x1), ("4", 0x2), ("NFS3", 0x1), ("NFS4", 0x2), ("9P", 0x4)];

#[allow(dead_code)]
pub fn core_schema() -> BlockDescriptor<EmbeddedBlock<CoreParams>> {
    BlockDescriptor::new(
        "NFS_Core_Param",
        vec![
            FieldDescriptor::inet_port("NFS_Port", 0, u16::MAX, 2049, |c: &mut CoreParams| {
                &mut c.nfs_port
            }),
            FieldDescriptor::list("Protocols", PROTOCOLS, 0x3, 0x7, |c: &mut CoreParams| {
                &mut c.protocols
            }),
            FieldDescriptor::uint32("Nb_Worker", 1, 1024, 256, |c: &mut CoreParams| {
                &mut c.nb_worker
            }),
            FieldDescriptor::boolean("Enable_UDP", true, |c: &mut CoreParams| &mut c.enable_udp),
        ],
        EmbeddedBlock::new(),
    )
    .with_flags(stanza::FieldFlags::UNIQUE)
}

/// `Client` sub-block of an export.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Client {
    pub clients: Option<String>,
    pub access_type: u32,
}

/// `Export` block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Export {
    pub export_id: u16,
    pub path: Option<String>,
    pub pseudo: Option<String>,
    pub access_type: u32,
    pub squash: u32,
    pub clients: Vec<Client>,
}

pub const ACCESS: &[(&str, u32)] = &[("NONE", 0x0), ("RO", 0x1), ("RW", 0x3), ("MDONLY", 0x4)];
pub const SQUASH: &[(&str, u32)] = &[
    ("root_squash", 0x1),
    ("root", 0x1),
    ("all_squash", 0x2),
    ("all", 0x2),
    ("no_root_squash", 0x0),
    ("none", 0x0),
];

fn client_schema() -> BlockDescriptor<ListBlock<Client>> {
    BlockDescriptor::new(
        "Client",
        vec![
            FieldDescriptor::string("Clients", 1, 1024, None, |c: &mut Client| &mut c.clients)
                .mandatory(),
            FieldDescriptor::enumeration("Access_Type", ACCESS, 0x0, 0x7, |c: &mut Client| {
                &mut c.access_type
            }),
        ],
        ListBlock::new(),
    )
}

#[allow(dead_code)]
pub fn export_schema() -> BlockDescriptor<ListBlock<Export>> {
    BlockDescriptor::new(
        "Export",
        vec![
            FieldDescriptor::uint16("Export_Id", 0, u16::MAX, 1, |e: &mut Export| &mut e.export_id)
                .mandatory()
                .unique(),
            FieldDescriptor::path("Path", 1, 4096, None, |e: &mut Export| &mut e.path)
                .mandatory()
                .unique(),
            FieldDescriptor::path("Pseudo", 1, 4096, None, |e: &mut Export| &mut e.pseudo),
            FieldDescriptor::enumeration("Access_Type", ACCESS, 0x0, 0x7, |e: &mut Export| {
                &mut e.access_type
            }),
            FieldDescriptor::enumeration("Squash", SQUASH, 0x1, 0x3, |e: &mut Export| &mut e.squash),
            FieldDescriptor::block("Client", client_schema(), |e: &mut Export| &mut e.clients),
            FieldDescriptor::deprecated("Use_Cookie_Verifier", Some("no longer used")),
        ],
        ListBlock::validated(|e: &Export| match e.path.as_deref() {
            Some(p) if p.starts_with('/') => Ok(()),
            _ => Err("Path must be absolute".to_string()),
        }),
    )
}

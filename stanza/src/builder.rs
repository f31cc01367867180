//! Tree builder: configuration text to [`ParseTree`].
//!
//! The grammar is
//!
//! ```text
//! deflist    := (definition | include)*
//! definition := NAME '=' [term (',' term)*] ';'
//!             | NAME '{' deflist '}' [';']
//! include    := '%include' (string | path)
//! term       := ['-' | '~'] value
//! ```
//!
//! `%include` splices the definitions of another file into the block that
//! contains the directive. A build either returns a complete tree or an
//! error; partial trees are never handed out.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, SignOp, TermType, Token, TokenKind};
use crate::options::BuildOptions;
use crate::tree::{FileId, NodeId, ParseTree, Term};
use std::fs;
use std::path::{Path, PathBuf};

/// Parse the file at `path` using options taken from the environment.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, [`Error::Scan`] or
/// [`Error::Parse`] if its contents are malformed, and [`Error::Options`] if
/// a `STANZA_*` override is invalid.
pub fn build(path: &Path) -> Result<ParseTree> {
    let options = BuildOptions::builder().build()?;
    TreeBuilder::new(options).build_file(path)
}

/// Parse in-memory text with default options. `name` is used as the file
/// name in node locations and error messages.
///
/// # Errors
///
/// Returns [`Error::Scan`] or [`Error::Parse`] if the text is malformed.
///
/// # Examples
///
/// ```
/// use stanza::builder::parse_str;
///
/// let tree = parse_str("inline", "NFS_CORE_PARAM { NFS_Port = 2049; }").unwrap();
/// assert_eq!(tree.root().child_count(), 1);
/// assert!(parse_str("inline", "NFS_CORE_PARAM {").is_err());
/// ```
pub fn parse_str(name: &str, text: &str) -> Result<ParseTree> {
    TreeBuilder::new(BuildOptions::default()).build_str(name, text)
}

/// Builds parse trees under a fixed set of [`BuildOptions`].
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    options: BuildOptions,
}

impl TreeBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Parse the file at `path`.
    ///
    /// # Errors
    ///
    /// See [`build`].
    pub fn build_file(&self, path: &Path) -> Result<ParseTree> {
        let text = self.read(path)?;
        let mut session = Session::new(&self.options);
        session.stack.push(canonical(path));
        let name = path.display().to_string();
        session.parse_file(&name, &text, Some(path), NodeId::ROOT)?;
        log::debug!(
            "built tree from {} ({} nodes, {} files)",
            name,
            session.tree.len(),
            session.tree.files().len()
        );
        Ok(session.tree)
    }

    /// Parse in-memory text named `name`.
    ///
    /// # Errors
    ///
    /// See [`parse_str`]. Includes named by the text may also fail with
    /// [`Error::Scan`].
    pub fn build_str(&self, name: &str, text: &str) -> Result<ParseTree> {
        self.check_size(Path::new(name), text.len() as u64)?;
        let mut session = Session::new(&self.options);
        session.parse_file(name, text, None, NodeId::ROOT)?;
        Ok(session.tree)
    }

    fn read(&self, path: &Path) -> Result<String> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let meta = fs::metadata(path).map_err(io_err)?;
        self.check_size(path, meta.len())?;
        fs::read_to_string(path).map_err(io_err)
    }

    fn check_size(&self, path: &Path, len: u64) -> Result<()> {
        match self.options.max_file_size {
            Some(limit) if len > limit => Err(Error::Scan {
                file: path.display().to_string(),
                line: 0,
                message: format!("file is {len} bytes, larger than the {limit} byte limit"),
            }),
            _ => Ok(()),
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// State for one build: the tree under construction and the chain of files
/// currently being read.
struct Session<'o> {
    options: &'o BuildOptions,
    tree: ParseTree,
    stack: Vec<PathBuf>,
    depth: usize,
}

/// Token cursor over one file.
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    name: &'t str,
    path: Option<&'t Path>,
    file: FileId,
}

impl Cursor<'_> {
    fn peek(&self) -> &Token {
        // The lexer always ends the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        self.pos += 1;
        &self.tokens[idx]
    }

    fn error(&self, line: usize, message: String) -> Error {
        Error::Parse {
            file: self.name.to_string(),
            line,
            message,
        }
    }
}

impl<'o> Session<'o> {
    fn new(options: &'o BuildOptions) -> Self {
        Self {
            options,
            tree: ParseTree::new(),
            stack: Vec::new(),
            depth: 0,
        }
    }

    fn parse_file(
        &mut self,
        name: &str,
        text: &str,
        path: Option<&Path>,
        parent: NodeId,
    ) -> Result<()> {
        let tokens = Lexer::new(text, name).tokenize()?;
        let file = self.tree.add_file(name);
        let mut cur = Cursor {
            tokens: &tokens,
            pos: 0,
            name,
            path,
            file,
        };
        self.parse_deflist(&mut cur, parent, false)
    }

    fn parse_deflist(&mut self, cur: &mut Cursor<'_>, parent: NodeId, in_block: bool) -> Result<()> {
        loop {
            let token = cur.peek().clone();
            match &token.kind {
                TokenKind::Eof if in_block => {
                    return Err(cur.error(token.span.line, "missing '}' at end of file".into()));
                }
                TokenKind::Eof => return Ok(()),
                TokenKind::RBrace if in_block => return Ok(()),
                TokenKind::Include => {
                    cur.next();
                    self.parse_include(cur, parent, token.span.line)?;
                }
                TokenKind::Term(TermType::Token, name) => {
                    cur.next();
                    self.parse_definition(cur, parent, name, token.span.line)?;
                }
                TokenKind::Term(kind, text) => {
                    return Err(cur.error(
                        token.span.line,
                        format!("expected a parameter or block name, got {kind} ({text})"),
                    ));
                }
                other => {
                    return Err(cur.error(token.span.line, format!("unexpected {other}")));
                }
            }
        }
    }

    fn parse_definition(
        &mut self,
        cur: &mut Cursor<'_>,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> Result<()> {
        let token = cur.next().clone();
        match token.kind {
            TokenKind::Equals => {
                let terms = self.parse_terms(cur, name)?;
                self.tree.add_statement(parent, name, cur.file, line, terms);
                Ok(())
            }
            TokenKind::LBrace => {
                if self.depth >= self.options.max_block_depth {
                    return Err(cur.error(
                        line,
                        format!(
                            "block {name} nested deeper than {} levels",
                            self.options.max_block_depth
                        ),
                    ));
                }
                let block = self.tree.add_block(parent, name, cur.file, line);
                self.depth += 1;
                self.parse_deflist(cur, block, true)?;
                self.depth -= 1;
                cur.next(); // '}'
                if cur.peek().kind == TokenKind::Semicolon {
                    cur.next();
                }
                Ok(())
            }
            other => Err(cur.error(
                token.span.line,
                format!("expected '=' or '{{' after {name}, got {other}"),
            )),
        }
    }

    fn parse_terms(&mut self, cur: &mut Cursor<'_>, name: &str) -> Result<Vec<Term>> {
        let mut terms = Vec::new();
        if cur.peek().kind == TokenKind::Semicolon {
            cur.next();
            return Ok(terms);
        }

        loop {
            terms.push(self.parse_term(cur)?);
            let token = cur.next().clone();
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::Semicolon => return Ok(terms),
                other => {
                    return Err(cur.error(
                        token.span.line,
                        format!("expected ',' or ';' in the value of {name}, got {other}"),
                    ));
                }
            }
        }
    }

    fn parse_term(&mut self, cur: &mut Cursor<'_>) -> Result<Term> {
        let mut op: Option<SignOp> = None;
        if let TokenKind::Op(sign) = cur.peek().kind {
            op = Some(sign);
            cur.next();
        }

        let token = cur.next().clone();
        match token.kind {
            TokenKind::Term(kind, text) => {
                if op.is_some() && !kind.is_number() {
                    return Err(cur.error(
                        token.span.line,
                        format!("a sign can only precede a number, got {kind} ({text})"),
                    ));
                }
                let text = self.tree.intern(&text);
                Ok(Term::new(kind, text, op, token.span.line))
            }
            other => Err(cur.error(token.span.line, format!("expected a value, got {other}"))),
        }
    }

    fn parse_include(&mut self, cur: &mut Cursor<'_>, parent: NodeId, line: usize) -> Result<()> {
        let token = cur.next().clone();
        let target = match token.kind {
            TokenKind::Term(
                TermType::DQuote
                | TermType::SQuote
                | TermType::Token
                | TermType::Path
                | TermType::AbsPath,
                text,
            ) => text,
            other => {
                return Err(cur.error(line, format!("%include needs a file name, got {other}")));
            }
        };
        if cur.peek().kind == TokenKind::Semicolon {
            cur.next();
        }

        let scan_error = |message: String| Error::Scan {
            file: cur.name.to_string(),
            line,
            message,
        };

        let path = self.options.resolve_include(&target, cur.path);
        if self.stack.len() > self.options.max_include_depth {
            return Err(scan_error(format!(
                "include nesting deeper than {} at {}",
                self.options.max_include_depth,
                path.display()
            )));
        }
        let key = canonical(&path);
        if self.stack.contains(&key) {
            return Err(scan_error(format!("include cycle at {}", path.display())));
        }

        let text = match fs::metadata(&path) {
            Ok(meta) => match self.options.max_file_size {
                Some(limit) if meta.len() > limit => {
                    return Err(scan_error(format!(
                        "{} is {} bytes, larger than the {limit} byte limit",
                        path.display(),
                        meta.len()
                    )));
                }
                _ => fs::read_to_string(&path),
            },
            Err(e) => Err(e),
        }
        .map_err(|e| scan_error(format!("cannot open {}: {e}", path.display())))?;

        log::debug!("including {} into {}", path.display(), cur.name);
        self.stack.push(key);
        let name = path.display().to_string();
        self.parse_file(&name, &text, Some(&path), parent)?;
        self.stack.pop();
        Ok(())
    }
}

//! Typed statement tree produced by the parser.
//! Every polymorphic shape is a tagged enum with exhaustive handling; parse
//! trees are short-lived owning trees. Identifier and number spellings are
//! preserved so the renderer can round-trip the corpus.

use crate::ident::{Ident, ObjectName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub block: bool,
}

/// A parsed statement with its attached comments. Comments with no blank
/// line before the statement are leading; a comment on the closing line of
/// a statement is trailing; anything else parses as a standalone
/// `StatementKind::Comment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub leading: Vec<Comment>,
    pub kind: StatementKind,
    pub trailing: Option<Comment>,
}

impl Statement {
    pub fn bare(kind: StatementKind) -> Self {
        Statement { leading: Vec::new(), kind, trailing: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    Comment(Comment),

    CreateDatabase(CreateDatabase),
    AlterDatabase(AlterDatabase),
    DropDatabase(DropDatabase),
    RenameDatabase(RenameDatabase),
    AttachDatabase(AttachDatabase),
    DetachDatabase(DetachDatabase),

    CreateTable(CreateTable),
    AlterTable(AlterTable),
    /// DROP TABLE / DICTIONARY / VIEW.
    Drop(DropObject),
    /// RENAME TABLE a TO b, c TO d / RENAME DICTIONARY.
    Rename(RenameObjects),
    Attach(AttachObject),
    Detach(DetachObject),

    CreateDictionary(CreateDictionary),

    CreateNamedCollection(CreateNamedCollection),
    AlterNamedCollection(AlterNamedCollection),
    DropNamedCollection(DropNamedCollection),

    CreateView(CreateView),

    CreateRole(CreateRole),
    AlterRole(AlterRole),
    DropRole(DropRole),
    Grant(GrantStmt),
    Revoke(RevokeStmt),
    SetRole(SetRole),
    SetDefaultRole(SetDefaultRole),

    CreateFunction(CreateFunction),
    DropFunction(DropFunction),

    CreateUser(CreateUser),
    AlterUser(AlterUser),
    DropUser(DropUser),

    Select(SelectQuery),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    Dictionary,
    View,
}

impl ObjectKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::Dictionary => "DICTIONARY",
            ObjectKind::View => "VIEW",
        }
    }
}

// ---------------------------------------------------------------------------
// Shared clauses

/// Engine clause. `params` is None for a bare engine name (`ENGINE = Memory`)
/// and Some for a parenthesized list, possibly empty (`ENGINE = MergeTree()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    pub name: String,
    pub params: Option<Vec<EngineParam>>,
}

impl Engine {
    pub fn bare<S: Into<String>>(name: S) -> Self {
        Engine { name: name.into(), params: None }
    }
}

/// Engine parameters that fail expression parsing are preserved verbatim so
/// extraction round-trips across server minor versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineParam {
    Expr(Expr),
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub name: Ident,
    pub value: Expr,
}

// ---------------------------------------------------------------------------
// Databases

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub engine: Option<Engine>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterDatabase {
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub action: AlterDatabaseAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterDatabaseAction {
    ModifyComment(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropDatabase {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub sync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameDatabase {
    pub from: Ident,
    pub to: Ident,
    pub cluster: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachDatabase {
    pub if_not_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub engine: Option<Engine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachDatabase {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub sync: bool,
}

// ---------------------------------------------------------------------------
// Tables

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub elements: Vec<TableElement>,
    pub engine: Option<Engine>,
    pub order_by: Option<Expr>,
    pub partition_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub sample_by: Option<Expr>,
    pub ttl: Option<Expr>,
    pub settings: Vec<Setting>,
    /// `AS <source-table>` or `AS <table-function>(...)`; when present the
    /// column list is inherited, not authored.
    pub as_source: Option<AsSource>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AsSource {
    Table(ObjectName),
    TableFunction { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableElement {
    Column(ColumnDef),
    Index(IndexDef),
    Constraint(ConstraintDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: Ident,
    /// Absent when the column is declared through its default expression
    /// alone (`c DEFAULT now()`).
    pub data_type: Option<DataType>,
    pub default: Option<DefaultSpec>,
    pub codecs: Vec<Codec>,
    pub ttl: Option<Expr>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSpec {
    pub kind: DefaultKind,
    /// EPHEMERAL may omit the expression.
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultKind {
    Default,
    Materialized,
    Ephemeral,
    Alias,
}

impl DefaultKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DefaultKind::Default => "DEFAULT",
            DefaultKind::Materialized => "MATERIALIZED",
            DefaultKind::Ephemeral => "EPHEMERAL",
            DefaultKind::Alias => "ALIAS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Codec {
    pub name: String,
    pub params: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: Ident,
    pub expr: Expr,
    pub index_type: IndexType,
    pub granularity: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexType {
    pub name: String,
    pub params: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub name: Ident,
    pub kind: ConstraintKind,
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Check,
    Assume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTable {
    pub if_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub ops: Vec<AlterTableOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterTableOp {
    AddColumn { if_not_exists: bool, column: ColumnDef, position: Option<ColumnPosition> },
    DropColumn { if_exists: bool, name: Ident },
    ModifyColumn { if_exists: bool, column: ColumnDef },
    RenameColumn { if_exists: bool, from: Ident, to: Ident },
    CommentColumn { if_exists: bool, name: Ident, comment: String },
    AddIndex { if_not_exists: bool, index: IndexDef },
    DropIndex { if_exists: bool, name: Ident },
    AddConstraint { if_not_exists: bool, constraint: ConstraintDef },
    DropConstraint { if_exists: bool, name: Ident },
    ModifyOrderBy(Expr),
    ModifyTtl(Expr),
    ModifySettings(Vec<Setting>),
    ModifyComment(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnPosition {
    First,
    After(Ident),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropObject {
    pub kind: ObjectKind,
    pub if_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub sync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameObjects {
    pub kind: ObjectKind,
    pub renames: Vec<(ObjectName, ObjectName)>,
    pub cluster: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachObject {
    pub kind: ObjectKind,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetachObject {
    pub kind: ObjectKind,
    pub if_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub permanently: bool,
    pub sync: bool,
}

// ---------------------------------------------------------------------------
// Dictionaries

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDictionary {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub columns: Vec<DictionaryColumn>,
    pub primary_key: Vec<Ident>,
    pub source: Option<DictionarySource>,
    pub layout: Option<DictionaryLayout>,
    pub lifetime: Option<Lifetime>,
    pub settings: Vec<Setting>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryColumn {
    pub name: Ident,
    pub data_type: DataType,
    pub default: Option<Expr>,
    pub expression: Option<Expr>,
    pub hierarchical: bool,
    pub injective: bool,
    pub is_object_id: bool,
}

/// `SOURCE(CLICKHOUSE(HOST 'localhost' PORT 9000 TABLE 'src'))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionarySource {
    pub name: String,
    pub params: Vec<(Ident, Expr)>,
}

impl DictionarySource {
    pub fn param(&self, key: &str) -> Option<&Expr> {
        self.params.iter().find(|(k, _)| k.text.eq_ignore_ascii_case(key)).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryLayout {
    pub name: String,
    pub params: Vec<(Ident, Expr)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lifetime {
    Single(u64),
    MinMax { min: u64, max: u64 },
}

// ---------------------------------------------------------------------------
// Named collections

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNamedCollection {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub entries: Vec<CollectionEntry>,
    /// Collection-level `[NOT] OVERRIDABLE` trailing policy.
    pub overridable: Option<bool>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub key: Ident,
    pub value: Expr,
    pub overridable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterNamedCollection {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub set: Vec<CollectionEntry>,
    pub delete: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropNamedCollection {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
}

// ---------------------------------------------------------------------------
// Views

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateView {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub materialized: bool,
    pub name: ObjectName,
    pub cluster: Option<Ident>,
    pub to: Option<AsSource>,
    pub engine: Option<Engine>,
    pub order_by: Option<Expr>,
    pub partition_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub sample_by: Option<Expr>,
    pub populate: bool,
    pub query: SelectQuery,
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Roles / grants

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRole {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub names: Vec<Ident>,
    pub cluster: Option<Ident>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterRole {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub rename_to: Option<Ident>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropRole {
    pub if_exists: bool,
    pub names: Vec<Ident>,
    pub cluster: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantStmt {
    pub cluster: Option<Ident>,
    pub kind: GrantKind,
    pub grantees: Vec<Ident>,
    pub grant_option: bool,
    pub admin_option: bool,
    pub replace_option: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrantKind {
    Privileges { privileges: Vec<Privilege>, target: GrantTarget },
    Roles { roles: Vec<Ident> },
}

/// A privilege keyword sequence (`SELECT`, `ALTER UPDATE`, ...) with an
/// optional column restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Privilege {
    pub name: String,
    pub columns: Vec<Ident>,
}

/// `ON *.*`, `ON db.*`, `ON db.table` or `ON table`. `None` means `*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantTarget {
    pub database: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevokeStmt {
    pub cluster: Option<Ident>,
    pub grant_option_for: bool,
    pub admin_option_for: bool,
    pub kind: GrantKind,
    pub grantees: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleSpec {
    Default,
    None,
    All,
    AllExcept(Vec<Ident>),
    List(Vec<Ident>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRole {
    pub spec: RoleSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefaultRole {
    pub spec: RoleSpec,
    pub users: Vec<Ident>,
}

// ---------------------------------------------------------------------------
// Functions

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFunction {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    /// Always an `Expr::Lambda`.
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropFunction {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
}

// ---------------------------------------------------------------------------
// Users

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUser {
    pub or_replace: bool,
    pub if_not_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub identification: Option<Identification>,
    pub hosts: Vec<HostClause>,
    pub valid_until: Option<String>,
    /// `IN <access storage>` (e.g. `local_directory`).
    pub access_storage: Option<String>,
    pub default_roles: Option<RoleSpec>,
    pub default_database: Option<Ident>,
    pub grantees: Option<GranteesSpec>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterUser {
    pub if_exists: bool,
    pub name: Ident,
    pub cluster: Option<Ident>,
    pub rename_to: Option<Ident>,
    pub identification: Option<Identification>,
    pub hosts: Option<Vec<HostClause>>,
    pub valid_until: Option<String>,
    pub default_roles: Option<RoleSpec>,
    pub default_database: Option<Ident>,
    pub grantees: Option<GranteesSpec>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUser {
    pub if_exists: bool,
    pub names: Vec<Ident>,
    pub cluster: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Identification {
    NoPassword,
    PlaintextPassword(String),
    Sha256Password(String),
    Sha256Hash { hash: String, salt: Option<String> },
    DoubleSha1Password(String),
    DoubleSha1Hash(String),
    BcryptPassword(String),
    BcryptHash(String),
    Ldap { server: String },
    Kerberos { realm: Option<String> },
    SslCertificate { common_names: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostClause {
    Any,
    None,
    Local,
    Ip(String),
    Like(String),
    Name(String),
    Regexp(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranteesSpec {
    pub grantees: Vec<GranteeItem>,
    pub except: Vec<GranteeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GranteeItem {
    Any,
    None,
    Named(Ident),
}

// ---------------------------------------------------------------------------
// SELECT subset (view bodies)

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub body: SelectBody,
    /// UNION [ALL|DISTINCT] continuations, in order.
    pub unions: Vec<(bool, SelectBody)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectBody {
    pub with: Vec<CteItem>,
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderExpr>,
    pub limit: Option<LimitClause>,
    pub settings: Vec<Setting>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CteItem {
    /// `WITH name AS (SELECT ...)`
    Query { name: Ident, query: Box<SelectQuery> },
    /// `WITH <expr> AS name`
    Scalar { expr: Expr, alias: Ident },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    Wildcard,
    QualifiedWildcard(ObjectName),
    Expr { expr: Expr, alias: Option<Ident> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub base: TableFactor,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableFactor {
    Table { name: ObjectName, final_mod: bool, alias: Option<Ident> },
    Function { name: String, args: Vec<Expr>, alias: Option<Ident> },
    Subquery { query: Box<SelectQuery>, alias: Option<Ident> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub factor: TableFactor,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<Ident>),
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpr {
    pub expr: Expr,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitClause {
    pub limit: Expr,
    pub offset: Option<Expr>,
}

// ---------------------------------------------------------------------------
// Expressions

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// Possibly dotted identifier chain: `a`, `a.b`, `a.b.c`.
    Identifier(Vec<Ident>),
    /// `*` as a function argument (`count(*)`).
    Wildcard,
    Function(FunctionCall),
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { left: Box<Expr>, op: BinOp, right: Box<Expr> },
    Not(Box<Expr>),
    IsNull { expr: Box<Expr>, negated: bool },
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    InQuery { expr: Box<Expr>, query: Box<SelectQuery>, negated: bool },
    Between { expr: Box<Expr>, low: Box<Expr>, high: Box<Expr>, negated: bool },
    Array(Vec<Expr>),
    Tuple(Vec<Expr>),
    Cast { expr: Box<Expr>, data_type: DataType },
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<(Expr, Expr)>,
        else_expr: Option<Box<Expr>>,
    },
    Interval { value: Box<Expr>, unit: String },
    Extract { unit: String, expr: Box<Expr> },
    Lambda { params: Vec<Ident>, body: Box<Expr> },
    Subquery(Box<SelectQuery>),
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
}

/// A call with an optional parametric group: `quantile(0.9)(latency)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub params: Option<Vec<Expr>>,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub over: Option<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    NotLike,
    ILike,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Concat,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "OR",
            BinOp::And => "AND",
            BinOp::Eq => "=",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Like => "LIKE",
            BinOp::NotLike => "NOT LIKE",
            BinOp::ILike => "ILIKE",
            BinOp::Plus => "+",
            BinOp::Minus => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Inner value with escapes resolved.
    String(String),
    /// Numeric literal exactly as spelled.
    Number(String),
    Bool(bool),
    Null,
}

// ---------------------------------------------------------------------------
// Data types

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    Simple { name: String, params: Vec<TypeParam> },
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Tuple(Vec<TupleElement>),
    Nested(Vec<NestedColumn>),
    LowCardinality(Box<DataType>),
}

impl DataType {
    pub fn simple<S: Into<String>>(name: S) -> Self {
        DataType::Simple { name: name.into(), params: Vec::new() }
    }

    /// Peel Nullable/LowCardinality wrappers down to the underlying type.
    pub fn unwrapped(&self) -> &DataType {
        match self {
            DataType::Nullable(inner) | DataType::LowCardinality(inner) => inner.unwrapped(),
            other => other,
        }
    }
}

/// Type parameters are either nested types (`Array(String)` inside `Map`)
/// or expressions (`Decimal(18, 4)`, `Enum8('a' = 1)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeParam {
    Type(DataType),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleElement {
    pub name: Option<Ident>,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedColumn {
    pub name: Ident,
    pub data_type: DataType,
}

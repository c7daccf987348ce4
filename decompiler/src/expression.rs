use decaf_reader::{
    field_type::{BaseType, FieldType},
    instruction::{FieldOperand, LoadedConstant, MethodOperand},
};

/// A binary operator, in source form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Ushr => ">>>",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
        }
    }
}

/// A comparison operator, in source form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
        }
    }

    pub fn negated(&self) -> ComparisonOp {
        match self {
            ComparisonOp::Eq => ComparisonOp::Ne,
            ComparisonOp::Ne => ComparisonOp::Eq,
            ComparisonOp::Lt => ComparisonOp::Ge,
            ComparisonOp::Ge => ComparisonOp::Lt,
            ComparisonOp::Gt => ComparisonOp::Le,
            ComparisonOp::Le => ComparisonOp::Gt,
        }
    }
}

/// How an invocation dispatches; drives receiver rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A reconstructed value: what one operand-stack slot holds, expressed as
/// source-level structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LoadedConstant),
    Null,
    This,
    /// The receiver of a superclass member access
    Super,
    Local { index: u16, name: String },
    /// The exception value a handler block starts with
    CaughtException(Option<String>),
    FieldGet { object: Box<Expr>, field: FieldOperand },
    StaticFieldGet { field: FieldOperand },
    ArrayGet { array: Box<Expr>, index: Box<Expr> },
    ArrayLength(Box<Expr>),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Negate(Box<Expr>),
    Comparison { op: ComparisonOp, left: Box<Expr>, right: Box<Expr> },
    /// The three-way result of the lcmp/fcmpl family, folded into a
    /// Comparison by the conditional branch that consumes it
    CompareValue { left: Box<Expr>, right: Box<Expr> },
    Invoke {
        kind: InvokeKind,
        receiver: Option<Box<Expr>>,
        method: MethodOperand,
        arguments: Vec<Expr>,
    },
    /// An invokedynamic call site, kept by name only
    DynamicInvoke { name: String, arguments: Vec<Expr> },
    New { class_name: String, arguments: Vec<Expr> },
    /// The result of `new` before its constructor has run. Replaced by a
    /// `New` node when the matching `<init>` call is seen
    UninitializedNew { class_name: String, id: usize },
    NewArray { element: FieldType, length: Box<Expr> },
    NewMultiArray { class_name: String, lengths: Vec<Expr> },
    Cast { target: FieldType, value: Box<Expr> },
    InstanceOf { class_name: String, value: Box<Expr> },
    /// A value the simulation could not model; carries placeholder text
    Opaque(String),
}

/// One reconstructed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    LocalStore { index: u16, name: String, value: Expr },
    FieldPut { object: Expr, field: FieldOperand, value: Expr },
    StaticFieldPut { field: FieldOperand, value: Expr },
    ArrayPut { array: Expr, index: Expr, value: Expr },
    /// An expression evaluated for its effect, result discarded
    Expression(Expr),
    Increment { name: String, delta: i16 },
    Return(Option<Expr>),
    Throw(Expr),
    MonitorEnter(Expr),
    MonitorExit(Expr),
}

impl Expr {
    /// Whether evaluating the expression can have observable effects, which
    /// decides if a discarded value still renders as a statement.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Expr::Invoke { .. }
            | Expr::DynamicInvoke { .. }
            | Expr::New { .. }
            | Expr::UninitializedNew { .. }
            | Expr::NewArray { .. }
            | Expr::NewMultiArray { .. }
            | Expr::Opaque(_) => true,
            Expr::Literal(_)
            | Expr::Null
            | Expr::This
            | Expr::Super
            | Expr::Local { .. }
            | Expr::CaughtException(_)
            | Expr::StaticFieldGet { .. } => false,
            Expr::FieldGet { object, .. } => object.has_side_effects(),
            Expr::ArrayGet { array, index } => array.has_side_effects() || index.has_side_effects(),
            Expr::ArrayLength(value) | Expr::Negate(value) => value.has_side_effects(),
            Expr::Binary { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::CompareValue { left, right } => {
                left.has_side_effects() || right.has_side_effects()
            }
            Expr::Cast { value, .. } => value.has_side_effects(),
            Expr::InstanceOf { value, .. } => value.has_side_effects(),
        }
    }

    /// The static type of the value, when the shape of the expression
    /// reveals it. Used to type local variables at their first store.
    pub fn static_type(&self) -> Option<FieldType> {
        match self {
            Expr::Literal(constant) => Some(match constant {
                LoadedConstant::Integer(_) => FieldType::Base(BaseType::Int),
                LoadedConstant::Float(_) => FieldType::Base(BaseType::Float),
                LoadedConstant::Long(_) => FieldType::Base(BaseType::Long),
                LoadedConstant::Double(_) => FieldType::Base(BaseType::Double),
                LoadedConstant::String(_) => FieldType::Object("java/lang/String".to_string()),
                LoadedConstant::Class(_) => FieldType::Object("java/lang/Class".to_string()),
                LoadedConstant::Opaque(_) => return None,
            }),
            Expr::CaughtException(class_name) => {
                class_name.as_ref().map(|name| FieldType::Object(name.clone()))
            }
            Expr::FieldGet { field, .. } | Expr::StaticFieldGet { field } => {
                Some(field.field_type.clone())
            }
            Expr::ArrayLength(_) | Expr::CompareValue { .. } => {
                Some(FieldType::Base(BaseType::Int))
            }
            Expr::Comparison { .. } | Expr::InstanceOf { .. } => {
                Some(FieldType::Base(BaseType::Boolean))
            }
            Expr::Binary { left, right, .. } => left.static_type().or_else(|| right.static_type()),
            Expr::Negate(value) => value.static_type(),
            Expr::Invoke { method, .. } => method.descriptor.return_type.clone(),
            Expr::New { class_name, .. } | Expr::UninitializedNew { class_name, .. } => {
                Some(FieldType::Object(class_name.clone()))
            }
            Expr::NewArray { element, .. } => Some(FieldType::Array(Box::new(element.clone()))),
            Expr::Cast { target, .. } => Some(target.clone()),
            Expr::ArrayGet { array, .. } => match array.static_type() {
                Some(FieldType::Array(component)) => Some(*component),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the value occupies two stack slots worth of data. Decides
    /// how the pop2/dup2 family is interpreted.
    pub fn is_wide(&self) -> bool {
        matches!(
            self.static_type(),
            Some(FieldType::Base(BaseType::Long)) | Some(FieldType::Base(BaseType::Double))
        )
    }
}

//! The meta-registry: interned type descriptors for one compile request.
//!
//! Structural types (primitives, functions, meta types) are hash-consed, so
//! two equal descriptors always share one [`TypeId`] and type equality is
//! handle equality. Object types are nominal: every
//! [`declare_object`](MetaRegistry::declare_object) creates a fresh type.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

// ══════════════════════════════════════════════════════════════════════════════
// Handles
// ══════════════════════════════════════════════════════════════════════════════

/// An interned type. Equal types always have the same handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The error marker; silences diagnostics that depend on it.
    pub const UNKNOWN: TypeId = TypeId(0);
    pub const NUMBER: TypeId = TypeId(1);
    pub const STRING: TypeId = TypeId(2);
    pub const BOOLEAN: TypeId = TypeId(3);
    pub const UNIT: TypeId = TypeId(4);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_unknown(self) -> bool {
        self == TypeId::UNKNOWN
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Identity of a nominal object type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct ObjectId(pub u32);

// ══════════════════════════════════════════════════════════════════════════════
// Descriptors
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    Unknown,
    Number,
    String,
    Boolean,
    Unit,
    Function { params: Vec<TypeId>, ret: TypeId },
    Object(ObjectId),
    /// The type of a type: a name bound to `Meta(t)` denotes `t`.
    Meta(TypeId),
}

/// What declared an object type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectKind {
    /// A Shed `class` instance.
    Class,
    /// A module interface.
    Module,
    /// A host object seeded by a builtin profile.
    Host,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Member {
    pub name: String,
    /// `None` while an unannotated member's initialiser is still unchecked.
    pub ty: Option<TypeId>,
    pub mutable: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObjectType {
    pub name: String,
    pub kind: ObjectKind,
    /// In declaration order.
    pub members: Vec<Member>,
    /// Constructor parameter types, for classes.
    pub constructor: Option<Vec<TypeId>>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Registry
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct MetaRegistry {
    cache: HashMap<TypeKind, TypeId>,
    types: Vec<TypeKind>,
    objects: Vec<ObjectType>,
}

impl Default for MetaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaRegistry {
    /// A registry with the primitive types pre-interned at their constant
    /// handles.
    pub fn new() -> Self {
        let mut registry = Self {
            cache: HashMap::new(),
            types: Vec::new(),
            objects: Vec::new(),
        };
        for (kind, id) in [
            (TypeKind::Unknown, TypeId::UNKNOWN),
            (TypeKind::Number, TypeId::NUMBER),
            (TypeKind::String, TypeId::STRING),
            (TypeKind::Boolean, TypeId::BOOLEAN),
            (TypeKind::Unit, TypeId::UNIT),
        ] {
            let interned = registry.intern(kind);
            debug_assert_eq!(interned, id);
        }
        registry
    }

    /// Intern a descriptor, returning the existing handle if it is known.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind.clone());
        self.cache.insert(kind, id);
        id
    }

    pub fn kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeKind::Function { params, ret })
    }

    pub fn meta_of(&mut self, ty: TypeId) -> TypeId {
        self.intern(TypeKind::Meta(ty))
    }

    /// The type a `Meta(t)` denotes.
    pub fn denoted(&self, ty: TypeId) -> Option<TypeId> {
        match self.kind(ty) {
            TypeKind::Meta(inner) => Some(*inner),
            _ => None,
        }
    }

    // ── Objects ───────────────────────────────────────────────────────────

    /// Declare a fresh nominal object type with no members.
    pub fn declare_object(&mut self, name: impl Into<String>, kind: ObjectKind) -> TypeId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectType {
            name: name.into(),
            kind,
            members: Vec::new(),
            constructor: None,
        });
        self.intern(TypeKind::Object(id))
    }

    pub fn object(&self, ty: TypeId) -> Option<&ObjectType> {
        match self.kind(ty) {
            TypeKind::Object(id) => self.objects.get(id.0 as usize),
            _ => None,
        }
    }

    fn object_mut(&mut self, ty: TypeId) -> Option<&mut ObjectType> {
        match self.types.get(ty.index()) {
            Some(TypeKind::Object(id)) => self.objects.get_mut(id.0 as usize),
            _ => None,
        }
    }

    /// Add a member; returns `false` if the name is already taken.
    pub fn add_member(&mut self, ty: TypeId, member: Member) -> bool {
        let Some(object) = self.object_mut(ty) else {
            return false;
        };
        if object.members.iter().any(|m| m.name == member.name) {
            return false;
        }
        object.members.push(member);
        true
    }

    /// Record the type of a member declared without one.
    pub fn set_member_type(&mut self, ty: TypeId, name: &str, member_ty: TypeId) {
        if let Some(member) = self
            .object_mut(ty)
            .and_then(|o| o.members.iter_mut().find(|m| m.name == name))
        {
            member.ty = Some(member_ty);
        }
    }

    pub fn set_constructor(&mut self, ty: TypeId, params: Vec<TypeId>) {
        if let Some(object) = self.object_mut(ty) {
            object.constructor = Some(params);
        }
    }

    pub fn member(&self, ty: TypeId, name: &str) -> Option<&Member> {
        self.object(ty)?.members.iter().find(|m| m.name == name)
    }

    // ── Relations ─────────────────────────────────────────────────────────

    /// Whether a value of type `from` may be used where `to` is expected.
    /// `Unknown` is compatible with everything, so one error never cascades.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to || from.is_unknown() || to.is_unknown()
    }

    /// A user-facing rendering of a type.
    pub fn display(&self, ty: TypeId) -> String {
        match self.kind(ty) {
            TypeKind::Unknown => "Unknown".to_string(),
            TypeKind::Number => "Number".to_string(),
            TypeKind::String => "String".to_string(),
            TypeKind::Boolean => "Boolean".to_string(),
            TypeKind::Unit => "Unit".to_string(),
            TypeKind::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|&p| self.display(p)).collect();
                format!("({}) -> {}", params.join(", "), self.display(*ret))
            }
            TypeKind::Object(id) => self
                .objects
                .get(id.0 as usize)
                .map(|o| o.name.clone())
                .unwrap_or_else(|| format!("object#{}", id.0)),
            TypeKind::Meta(inner) => format!("Meta({})", self.display(*inner)),
        }
    }
}

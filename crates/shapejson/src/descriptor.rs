//! Type descriptor cache.
//!
//! Rust has no runtime member discovery, so each object type registers its
//! members once through [`Describe`]. The first lookup of a type runs that
//! registration and publishes an immutable [`TypeDescriptor`]; every later
//! lookup, from any thread, gets the same `Arc`.
//!
//! Concurrent first lookups of one type may both build a descriptor; the first
//! insert wins and the other copy is dropped. Registration is pure, so both
//! copies are equivalent.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::context::Context;
use crate::error::ConvertError;
use crate::filter::{names_match, NameCase};
use crate::reflect::{FromJson, Reflect};
use crate::types::ShapeHint;

/// Member registration for an object type.
///
/// ```
/// use shapejson::{reflect_object, Describe, TypeBuilder};
///
/// #[derive(Default)]
/// struct Account { id: u32, owner: String, token: String }
///
/// impl Describe for Account {
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.constructor(Account::default);
///         ty.field("Id", |a| &a.id, |a| &mut a.id);
///         ty.field("Owner", |a| &a.owner, |a| &mut a.owner).rename("Holder");
///         ty.field("Token", |a| &a.token, |a| &mut a.token).ignore();
///     }
/// }
/// reflect_object!(Account);
///
/// let names: Vec<_> = shapejson::descriptor::<Account>()
///     .members()
///     .iter()
///     .map(|m| m.serialized_name().to_string())
///     .collect();
/// assert_eq!(names, ["Id", "Holder", "Token"]);
/// ```
pub trait Describe: Reflect + Sized {
    fn describe(ty: &mut TypeBuilder<Self>);
}

type Cache = RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Cached descriptor of `T`, built on first use.
pub fn descriptor<T: Describe>() -> Arc<TypeDescriptor> {
    let key = TypeId::of::<T>();
    if let Some(found) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Arc::clone(found);
    }

    // Built outside the lock: registration never re-enters the cache, but a
    // slow `describe` should not block readers of other types.
    let built = Arc::new(TypeDescriptor::build::<T>());
    let mut entries = cache().write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(entries.entry(key).or_insert(built))
}

/// Find an already-published descriptor by its type name.
pub fn find_descriptor(type_name: &str) -> Option<Arc<TypeDescriptor>> {
    cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .find(|d| d.type_name == type_name)
        .cloned()
}

trait Construct: Send + Sync {
    fn construct(&self) -> Box<dyn Any>;
}

struct Constructor<T>(fn() -> T);

impl<T: Any> Construct for Constructor<T> {
    fn construct(&self) -> Box<dyn Any> {
        Box::new((self.0)())
    }
}

/// Immutable member list and shape of one type.
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    shape: ShapeHint,
    members: Vec<PropertyDescriptor>,
    constructor: Option<Box<dyn Construct>>,
}

impl TypeDescriptor {
    /// Run `T`'s registration without touching the cache.
    pub fn build<T: Describe>() -> Self {
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);
        let descriptor = TypeDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            shape: T::shape_hint(),
            members: builder.members,
            constructor: builder.constructor,
        };
        log::trace!(
            "described {} ({} members, constructor: {})",
            descriptor.type_name,
            descriptor.members.len(),
            descriptor.has_constructor()
        );
        descriptor
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> ShapeHint {
        self.shape
    }

    /// Members in registration order.
    pub fn members(&self) -> &[PropertyDescriptor] {
        &self.members
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Build a fresh instance through the registered constructor.
    pub fn construct<T: Any>(&self) -> Option<T> {
        let boxed = self.constructor.as_ref()?.construct();
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    /// Member whose serialized name matches `key`.
    ///
    /// Exact matches win; otherwise names compare case-insensitively, either
    /// as registered or as rendered under `name_case`.
    pub fn find_member(&self, key: &str, name_case: NameCase) -> Option<&PropertyDescriptor> {
        self.find_member_where(key, name_case, |_| true)
    }

    /// Like [`find_member`](Self::find_member), but only members passing
    /// `eligible` are candidates, so a skipped member never claims a key.
    pub fn find_member_where<F>(
        &self,
        key: &str,
        name_case: NameCase,
        eligible: F,
    ) -> Option<&PropertyDescriptor>
    where
        F: Fn(&PropertyDescriptor) -> bool,
    {
        if key.is_empty() {
            return None;
        }
        let mut candidates = self.members.iter().filter(|m| eligible(*m));
        candidates
            .clone()
            .find(|m| m.serialized_name() == key)
            .or_else(|| {
                candidates.find(|m| {
                    names_match(key, m.serialized_name())
                        || names_match(key, &name_case.apply(m.serialized_name()))
                })
            })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("members", &self.members)
            .field("has_constructor", &self.has_constructor())
            .finish()
    }
}

/// Read/write access to one member, erased over the owner type.
trait MemberAccess: Send + Sync {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Reflect>;
    fn set(&self, owner: &mut dyn Any, token: &Value, cx: &Context) -> Result<(), ConvertError>;
}

struct Field<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: Any, F: Reflect + FromJson> MemberAccess for Field<T, F> {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Reflect> {
        let owner = owner.downcast_ref::<T>()?;
        let member: &'a dyn Reflect = (self.get)(owner);
        Some(member)
    }

    fn set(&self, owner: &mut dyn Any, token: &Value, cx: &Context) -> Result<(), ConvertError> {
        let owner = owner
            .downcast_mut::<T>()
            .ok_or_else(|| ConvertError::invalid(std::any::type_name::<T>(), "foreign owner"))?;
        *(self.get_mut)(owner) = F::from_json(token, cx)?;
        Ok(())
    }
}

struct ReadOnly<T, F> {
    get: fn(&T) -> &F,
}

impl<T: Any, F: Reflect> MemberAccess for ReadOnly<T, F> {
    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        false
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Reflect> {
        let owner = owner.downcast_ref::<T>()?;
        let member: &'a dyn Reflect = (self.get)(owner);
        Some(member)
    }

    fn set(&self, _owner: &mut dyn Any, _token: &Value, _cx: &Context) -> Result<(), ConvertError> {
        Ok(())
    }
}

struct WriteOnly<T, F> {
    set: fn(&mut T, F),
}

impl<T: Any, F: FromJson> MemberAccess for WriteOnly<T, F> {
    fn can_read(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        true
    }

    fn get<'a>(&self, _owner: &'a dyn Any) -> Option<&'a dyn Reflect> {
        None
    }

    fn set(&self, owner: &mut dyn Any, token: &Value, cx: &Context) -> Result<(), ConvertError> {
        let owner = owner
            .downcast_mut::<T>()
            .ok_or_else(|| ConvertError::invalid(std::any::type_name::<T>(), "foreign owner"))?;
        (self.set)(owner, F::from_json(token, cx)?);
        Ok(())
    }
}

/// One serializable member of a described type.
pub struct PropertyDescriptor {
    declared_name: &'static str,
    serialized_name: Cow<'static, str>,
    ignore: bool,
    public: bool,
    value_type: &'static str,
    shape: ShapeHint,
    access: Box<dyn MemberAccess>,
}

impl PropertyDescriptor {
    fn new<F: Reflect>(declared_name: &'static str, access: Box<dyn MemberAccess>) -> Self {
        Self {
            declared_name,
            serialized_name: Cow::Borrowed(declared_name),
            ignore: false,
            public: true,
            value_type: std::any::type_name::<F>(),
            shape: F::shape_hint(),
            access,
        }
    }

    pub fn declared_name(&self) -> &'static str {
        self.declared_name
    }

    pub fn serialized_name(&self) -> &str {
        &self.serialized_name
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn can_read(&self) -> bool {
        self.access.can_read()
    }

    pub fn can_write(&self) -> bool {
        self.access.can_write()
    }

    /// Type name of the member's declared type.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    pub fn shape(&self) -> ShapeHint {
        self.shape
    }

    /// Borrow this member out of `owner`; `None` for write-only members or a
    /// foreign owner.
    pub fn read<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Reflect> {
        self.access.get(owner)
    }

    /// Convert `token` and store it into `owner`. Read-only members accept
    /// and discard the token.
    pub fn write(
        &self,
        owner: &mut dyn Any,
        token: &Value,
        cx: &Context,
    ) -> Result<(), ConvertError> {
        self.access.set(owner, token, cx)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("declared_name", &self.declared_name)
            .field("serialized_name", &self.serialized_name)
            .field("ignore", &self.ignore)
            .field("public", &self.public)
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .field("value_type", &self.value_type)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Collects members and the constructor during [`Describe::describe`].
pub struct TypeBuilder<T> {
    members: Vec<PropertyDescriptor>,
    constructor: Option<Box<dyn Construct>>,
    _owner: PhantomData<fn() -> T>,
}

impl<T: Any> TypeBuilder<T> {
    fn new() -> Self {
        Self {
            members: Vec::new(),
            constructor: None,
            _owner: PhantomData,
        }
    }

    /// Register how to create an instance before members are written. Types
    /// without a constructor serialize but never deserialize.
    pub fn constructor(&mut self, ctor: fn() -> T) -> &mut Self {
        self.constructor = Some(Box::new(Constructor(ctor)));
        self
    }

    /// A readable and writable member.
    pub fn field<F: Reflect + FromJson>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> MemberDirectives<'_> {
        self.push(PropertyDescriptor::new::<F>(
            name,
            Box::new(Field { get, get_mut }),
        ))
    }

    /// A member that is serialized but never written by the decoder.
    pub fn read_only<F: Reflect>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
    ) -> MemberDirectives<'_> {
        self.push(PropertyDescriptor::new::<F>(name, Box::new(ReadOnly { get })))
    }

    /// A member the decoder writes through a setter but the encoder never reads.
    pub fn write_only<F: Reflect + FromJson>(
        &mut self,
        name: &'static str,
        set: fn(&mut T, F),
    ) -> MemberDirectives<'_> {
        self.push(PropertyDescriptor::new::<F>(name, Box::new(WriteOnly { set })))
    }

    fn push(&mut self, member: PropertyDescriptor) -> MemberDirectives<'_> {
        self.members.push(member);
        let index = self.members.len() - 1;
        MemberDirectives {
            member: &mut self.members[index],
        }
    }
}

/// Per-member directives, applied at registration time.
pub struct MemberDirectives<'b> {
    member: &'b mut PropertyDescriptor,
}

impl MemberDirectives<'_> {
    /// Serialize and look up the member under `name` instead of its declared name.
    pub fn rename(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.member.serialized_name = name.into();
        self
    }

    /// Exclude the member from both directions.
    pub fn ignore(self) -> Self {
        self.member.ignore = true;
        self
    }

    /// Only include the member when the context allows non-public members.
    pub fn non_public(self) -> Self {
        self.member.public = false;
        self
    }
}

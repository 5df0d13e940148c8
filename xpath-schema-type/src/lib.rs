//! The `xs:` atomic type lattice: the 22 W3C XML Schema primitive atomic
//! types plus the derived integer types, rooted at `xs:anyAtomicType`.

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// A built-in XML Schema simple type, as used in XPath's static and dynamic
/// type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Xs {
    AnyType,
    AnySimpleType,
    Untyped,
    AnyAtomicType,
    /// Not a real schema type; a convenience union of decimal/float/double
    /// used by `instance of xs:numeric` checks and type promotion.
    Numeric,
    UntypedAtomic,
    String,
    Boolean,
    Decimal,
    Float,
    Double,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    NonNegativeInteger,
    PositiveInteger,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    QName,
    Notation,
    Duration,
    YearMonthDuration,
    DayTimeDuration,
    DateTime,
    DateTimeStamp,
    Date,
    Time,
    GYearMonth,
    GYear,
    GMonthDay,
    GMonth,
    GDay,
    Base64Binary,
    HexBinary,
    AnyURI,
    NormalizedString,
    Token,
    Language,
    NMTOKEN,
    Name,
    NCName,
    ID,
    IDREF,
    ENTITY,
}

impl Xs {
    /// The XML Schema namespace URI all of these types live in.
    pub fn namespace() -> &'static str {
        XS_NAMESPACE
    }

    /// Resolve a namespace + local name pair to a built-in type.
    pub fn by_name(namespace: Option<&str>, local_name: &str) -> Option<Self> {
        if namespace == Some(XS_NAMESPACE) {
            Xs::by_local_name(local_name)
        } else {
            None
        }
    }

    /// Resolve a bare local name (already known to be in the `xs:`
    /// namespace) to a built-in type.
    pub fn by_local_name(local_name: &str) -> Option<Self> {
        use Xs::*;
        Some(match local_name {
            "anyType" => AnyType,
            "anySimpleType" => AnySimpleType,
            "untyped" => Untyped,
            "anyAtomicType" => AnyAtomicType,
            "numeric" => Numeric,
            "untypedAtomic" => UntypedAtomic,
            "string" => String,
            "boolean" => Boolean,
            "decimal" => Decimal,
            "float" => Float,
            "double" => Double,
            "integer" => Integer,
            "nonPositiveInteger" => NonPositiveInteger,
            "negativeInteger" => NegativeInteger,
            "nonNegativeInteger" => NonNegativeInteger,
            "positiveInteger" => PositiveInteger,
            "long" => Long,
            "int" => Int,
            "short" => Short,
            "byte" => Byte,
            "unsignedLong" => UnsignedLong,
            "unsignedInt" => UnsignedInt,
            "unsignedShort" => UnsignedShort,
            "unsignedByte" => UnsignedByte,
            "QName" => QName,
            "NOTATION" => Notation,
            "duration" => Duration,
            "yearMonthDuration" => YearMonthDuration,
            "dayTimeDuration" => DayTimeDuration,
            "dateTime" => DateTime,
            "dateTimeStamp" => DateTimeStamp,
            "date" => Date,
            "time" => Time,
            "gYearMonth" => GYearMonth,
            "gYear" => GYear,
            "gMonthDay" => GMonthDay,
            "gMonth" => GMonth,
            "gDay" => GDay,
            "base64Binary" => Base64Binary,
            "hexBinary" => HexBinary,
            "anyURI" => AnyURI,
            "normalizedString" => NormalizedString,
            "token" => Token,
            "language" => Language,
            "NMTOKEN" => NMTOKEN,
            "Name" => Name,
            "NCName" => NCName,
            "ID" => ID,
            "IDREF" => IDREF,
            "ENTITY" => ENTITY,
            _ => return None,
        })
    }

    /// The local name this type is known by in the `xs:` namespace.
    pub fn local_name(&self) -> &'static str {
        use Xs::*;
        match self {
            AnyType => "anyType",
            AnySimpleType => "anySimpleType",
            Untyped => "untyped",
            AnyAtomicType => "anyAtomicType",
            Numeric => "numeric",
            UntypedAtomic => "untypedAtomic",
            String => "string",
            Boolean => "boolean",
            Decimal => "decimal",
            Float => "float",
            Double => "double",
            Integer => "integer",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            NonNegativeInteger => "nonNegativeInteger",
            PositiveInteger => "positiveInteger",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            QName => "QName",
            Notation => "NOTATION",
            Duration => "duration",
            YearMonthDuration => "yearMonthDuration",
            DayTimeDuration => "dayTimeDuration",
            DateTime => "dateTime",
            DateTimeStamp => "dateTimeStamp",
            Date => "date",
            Time => "time",
            GYearMonth => "gYearMonth",
            GYear => "gYear",
            GMonthDay => "gMonthDay",
            GMonth => "gMonth",
            GDay => "gDay",
            Base64Binary => "base64Binary",
            HexBinary => "hexBinary",
            AnyURI => "anyURI",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            NMTOKEN => "NMTOKEN",
            Name => "Name",
            NCName => "NCName",
            ID => "ID",
            IDREF => "IDREF",
            ENTITY => "ENTITY",
        }
    }

    /// The type this one derives from by restriction, or `None` for the
    /// lattice root `xs:anyType`.
    pub fn parent(&self) -> Option<Xs> {
        use Xs::*;
        match self {
            AnyType => None,
            AnySimpleType | Untyped => Some(AnyType),
            AnyAtomicType | Numeric => Some(AnySimpleType),
            UntypedAtomic | String | Boolean | Float | Double | Decimal | QName | Notation
            | Duration | Time | GYearMonth | GYear | GMonthDay | GMonth | GDay
            | Base64Binary | HexBinary | AnyURI | DateTime | Date => Some(AnyAtomicType),
            Integer => Some(Decimal),
            NonPositiveInteger | Long | NonNegativeInteger => Some(Integer),
            NegativeInteger => Some(NonPositiveInteger),
            Int => Some(Long),
            Short => Some(Int),
            Byte => Some(Short),
            PositiveInteger | UnsignedLong => Some(NonNegativeInteger),
            UnsignedInt => Some(UnsignedLong),
            UnsignedShort => Some(UnsignedInt),
            UnsignedByte => Some(UnsignedShort),
            YearMonthDuration | DayTimeDuration => Some(Duration),
            DateTimeStamp => Some(DateTime),
            NormalizedString => Some(String),
            Token => Some(NormalizedString),
            Language | NMTOKEN | Name => Some(Token),
            NCName => Some(Name),
            ID | IDREF | ENTITY => Some(NCName),
        }
    }

    /// Does `self` derive from `other` (reflexively, via the `parent`
    /// chain)?
    pub fn derives_from(&self, other: Xs) -> bool {
        if *self == other {
            return true;
        }
        match self.parent() {
            Some(parent) => parent.derives_from(other),
            None => false,
        }
    }

    /// Is this one of the three numeric primitives (decimal, float,
    /// double) or a type deriving from them? Matches the `xs:numeric`
    /// pseudo-type used in function signatures.
    pub fn is_numeric(&self) -> bool {
        self.derives_from(Xs::Double) || self.derives_from(Xs::Float) || self.derives_from(Xs::Decimal)
    }

    /// `xs:numeric` matches any numeric type; every other type matches only
    /// itself or a subtype.
    pub fn matches(&self, other: Xs) -> bool {
        if other == Xs::Numeric {
            self.is_numeric()
        } else {
            self.derives_from(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_derives_from_decimal_and_any_atomic_type() {
        assert!(Xs::Integer.derives_from(Xs::Integer));
        assert!(Xs::Integer.derives_from(Xs::Decimal));
        assert!(Xs::Integer.derives_from(Xs::AnyAtomicType));
        assert!(Xs::Integer.derives_from(Xs::AnySimpleType));
        assert!(Xs::Integer.derives_from(Xs::AnyType));
        assert!(!Xs::Integer.derives_from(Xs::Double));
    }

    #[test]
    fn byte_derives_the_full_integer_chain() {
        assert!(Xs::Byte.derives_from(Xs::Short));
        assert!(Xs::Byte.derives_from(Xs::Int));
        assert!(Xs::Byte.derives_from(Xs::Long));
        assert!(Xs::Byte.derives_from(Xs::Integer));
    }

    #[test]
    fn numeric_matches_decimal_float_double() {
        assert!(Xs::Integer.matches(Xs::Numeric));
        assert!(Xs::Float.matches(Xs::Numeric));
        assert!(Xs::Double.matches(Xs::Numeric));
        assert!(!Xs::String.matches(Xs::Numeric));
    }

    #[test]
    fn by_name_requires_xs_namespace() {
        assert_eq!(Xs::by_name(Some(XS_NAMESPACE), "integer"), Some(Xs::Integer));
        assert_eq!(Xs::by_name(Some("urn:other"), "integer"), None);
    }
}

use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::reader::Reader;
use crate::writer::Writer;

/// Knows how to put instances of `T` on wire and how to get them back.
///
/// All three operations have to agree: `calculate_size` accounts for exactly the bytes `serialize` writes, and
/// `deserialize` consumes exactly those bytes. Nullable types are separate types, usually an `Option<T>` with a
/// parser of its own.
///
/// ```
/// use luminpack::{Evaluator, MemberCount, ObjectHeader, Parser, Reader, Result, Writer};
///
/// struct Point { x: i32, y: i32 }
///
/// struct PointParser;
///
/// const MEMBERS: MemberCount = MemberCount::new(2);
///
/// impl Parser<Point> for PointParser {
///     fn serialize(&self, writer: &mut Writer<'_>, value: &Point) -> Result<()> {
///         writer.write_object_header(MEMBERS)?;
///         luminpack::write_unmanaged!(writer, value.x, value.y)
///     }
///
///     fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<Point>) -> Result<()> {
///         match reader.read_object_header()? {
///             ObjectHeader::Members(2) => {
///                 let (x, y) = luminpack::read_unmanaged!(reader, i32, i32)?;
///                 *value = Some(Point { x, y });
///             },
///             _ => *value = None,
///         }
///         Ok(())
///     }
///
///     fn calculate_size(&self, evaluator: &mut Evaluator<'_>, _value: &Point) -> Result<()> {
///         evaluator.object_header(MEMBERS);
///         evaluator.add(8);
///         Ok(())
///     }
/// }
///
/// luminpack::register::<Point>(PointParser);
/// let bytes = luminpack::serialize(&Point { x: 1, y: -1 }, &Default::default()).unwrap();
/// assert_eq!(9, bytes.len());
/// let point: Point = luminpack::deserialize(&bytes, &Default::default()).unwrap().unwrap();
/// assert_eq!((1, -1), (point.x, point.y));
/// ```
pub trait Parser<T>: Send + Sync {

    fn serialize(&self, writer: &mut Writer<'_>, value: &T) -> Result<()>;

    /// Reads an instance into `value`. Implementations may reuse what `value` already holds; leaving or setting it
    /// to `None` signals an absent instance.
    fn deserialize(&self, reader: &mut Reader<'_>, value: &mut Option<T>) -> Result<()>;

    fn calculate_size(&self, evaluator: &mut Evaluator<'_>, value: &T) -> Result<()>;

}

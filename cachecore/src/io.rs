use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use crate::error::SimError;
use crate::trace::TraceReader;

/// Gets a sequential reader over a whole trace file
pub fn get_reader(file: File) -> Result<impl BufRead, SimError> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // Trace lines are short, a few pages at a time keeps the syscalls down
        const BUFFER_SIZE: usize = 16 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::{Cursor, Error, ErrorKind};
        use memmap2::{Advice, Mmap};
        // The map is only read, and only through the cursor, for as long as the reader lives
        unsafe {
            let m = Mmap::map(&file).map_err(|e| Error::new(ErrorKind::Other, format!("Couldn't memory map the file: {e}")))?;
            m.advise(Advice::Sequential).map_err(|e| Error::new(ErrorKind::Other, format!("Failed to provide access advice to the OS, {e}")))?;
            Ok(Cursor::new(m))
        }
    }
}

/// Opens a text trace for lazy reading, rejecting addresses wider than `address_width`
pub fn open_trace<P: AsRef<Path>>(path: P, address_width: u32) -> Result<TraceReader<impl BufRead>, SimError> {
    let file = File::open(path)?;
    Ok(TraceReader::new(get_reader(file)?).with_address_width(address_width))
}

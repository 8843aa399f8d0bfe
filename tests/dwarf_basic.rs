//! spec.md §8 scenario 5: DWARF base-type lookup, grounded in the original's
//! `DWARFBasicTest.cpp`.

mod support;

use cedo::binfmt::create_object_file_reader;
use cedo::dwarf::{read_from_elf_object, DwTag};
use cedo::filemap::FileMap;
use cedo::typebuilder::build_variable_type;
use support::{debug_abbrev_basic_types, debug_info_basic_types, ElfBuilder};

fn write_temp(bytes: &[u8], name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("cedo-test-{}-{}", std::process::id(), name));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn reads_basic_type_sizes_and_rejects_unknown_names() {
    let mut builder = ElfBuilder::new();
    builder.add_section(".debug_abbrev", debug_abbrev_basic_types());
    builder.add_section(".debug_info", debug_info_basic_types());
    let elf_bytes = builder.build();

    let path = write_temp(&elf_bytes, "dwarf-basic");
    let file = FileMap::open(&path).unwrap();
    let object = create_object_file_reader(file).unwrap();
    let dwarf = read_from_elf_object(object.as_ref()).unwrap();

    for (name, size) in [("one", 1u64), ("two", 2), ("four", 4), ("eight", 8)] {
        let ty = build_variable_type(&dwarf, name).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(ty.object_size(8), size, "{name} has the wrong size");
    }

    assert!(build_variable_type(&dwarf, "doesnt_exist").is_err());

    std::fs::remove_file(&path).ok();
}

#[test]
fn compile_unit_lists_every_other_die_as_a_child() {
    let mut builder = ElfBuilder::new();
    builder.add_section(".debug_abbrev", debug_abbrev_basic_types());
    builder.add_section(".debug_info", debug_info_basic_types());
    let elf_bytes = builder.build();

    let path = write_temp(&elf_bytes, "dwarf-children");
    let file = FileMap::open(&path).unwrap();
    let object = create_object_file_reader(file).unwrap();
    let dwarf = read_from_elf_object(object.as_ref()).unwrap();

    let cu = &dwarf.dies[0];
    assert_eq!(cu.tag, DwTag::COMPILE_UNIT);
    assert_eq!(cu.children_offsets.len(), dwarf.dies.len() - 1);

    std::fs::remove_file(&path).ok();
}

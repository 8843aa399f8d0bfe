//! spec.md §8 scenario 1, driven through the real pipeline: a synthetic ELF
//! object supplies DWARF types for two variables; their "live" bytes come
//! from ordinary Rust stack buffers, standing in for the dynamic loader's
//! addresses (spec.md §1 treats that loader as an external collaborator).

mod support;

use cedo::asm::{emit_asm, AsmStreamer, EmitOptions, OutputSymbol};
use cedo::binfmt::{create_object_file_reader, AddressSize, Endianness, FileFormat, Triple};
use cedo::dwarf::read_from_elf_object;
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
fn emits_expected_directives_for_two_base_types() {
    let mut builder = ElfBuilder::new();
    builder.add_section(".debug_abbrev", debug_abbrev_basic_types());
    builder.add_section(".debug_info", debug_info_basic_types());
    let elf_bytes = builder.build();

    let path = write_temp(&elf_bytes, "end-to-end");
    let file = FileMap::open(&path).unwrap();
    let object = create_object_file_reader(file).unwrap();
    let dwarf = read_from_elf_object(object.as_ref()).unwrap();

    // "live" bytes: [1,2,3,4] for the 4-byte variable, [1..8] for the 8-byte
    // one, matching spec.md §8 scenario 1 verbatim.
    let four_bytes: [u8; 4] = [1, 2, 3, 4];
    let eight_bytes: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    let symbols = vec![
        OutputSymbol {
            name: "sym4".into(),
            type_node: build_variable_type(&dwarf, "four").unwrap(),
            address: four_bytes.as_ptr() as usize,
        },
        OutputSymbol {
            name: "sym8".into(),
            type_node: build_variable_type(&dwarf, "eight").unwrap(),
            address: eight_bytes.as_ptr() as usize,
        },
    ];

    let output_triple = Triple {
        file_format: FileFormat::Elf,
        addr_size: AddressSize::Eight,
        endianness: Endianness::Little,
    };

    let mut buf = Vec::new();
    {
        let mut streamer = AsmStreamer::new(&mut buf);
        let options = EmitOptions {
            version_str: None,
            extended_align: false,
        };
        emit_asm(output_triple, &symbols, &mut streamer, &options).unwrap();
    }

    let output = String::from_utf8(buf).unwrap();
    assert!(output.contains(".size sym4, 4"));
    assert!(output.contains(".long 67305985"));
    assert!(output.contains(".size sym8, 8"));
    assert!(output.contains(".quad 578437695752307201"));
    assert!(output.contains(".ident \"cedo\""));

    std::fs::remove_file(&path).ok();
}
